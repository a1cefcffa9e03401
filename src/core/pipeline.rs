use crate::core::classifier::TreeEnsembleClassifier;
use crate::core::encoding::CategoricalEncoders;
use crate::core::features::preprocess;
use crate::core::shortlist::shortlist;
use crate::core::{ConfigProvider, LeadClassifier, Pipeline, Storage};
use crate::domain::model::{
    feature_vector, LeadCategory, LeadRecord, PredictionRow, ScoredLead, TransformResult,
    FEATURE_COUNT,
};
use crate::utils::error::{FlowError, Result};
use std::io::Write;
use std::path::Path;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const REQUIRED_COLUMNS: [&str; 13] = [
    "Lead ID",
    "First Name",
    "Last Name",
    "Company Name",
    "Website Visits",
    "Content Downloads",
    "Time Spent (mins)",
    "Actions on Platform",
    "Event Attendance",
    "Product Trials Initiated",
    "Seniority Level",
    "Industry",
    "Funding Stage",
];

pub struct LeadScorePipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
}

impl<S: Storage, C: ConfigProvider> LeadScorePipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    /// 輸出目錄下的檔案路徑
    pub fn output_file(&self, filename: &str) -> String {
        join_path(self.config.output_path(), filename)
    }

    async fn load_classifier(&self) -> Result<TreeEnsembleClassifier> {
        tracing::debug!("Loading classifier from: {}", self.config.model_file());
        let bytes = self.storage.read_file(self.config.model_file()).await?;
        let classifier = TreeEnsembleClassifier::from_json_slice(&bytes)?;

        if classifier.num_features() != FEATURE_COUNT {
            return Err(FlowError::FeatureMismatchError {
                expected: classifier.num_features(),
                actual: FEATURE_COUNT,
            });
        }
        Ok(classifier)
    }
}

pub fn join_path(dir: &str, filename: &str) -> String {
    Path::new(dir).join(filename).to_string_lossy().into_owned()
}

/// 將評分結果序列化為 CSV
pub fn write_csv(leads: &[ScoredLead]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if leads.is_empty() {
        // 沒有資料時仍輸出標題列
        writer.write_record(prediction_headers())?;
    }
    for lead in leads {
        writer.serialize(lead.to_row())?;
    }
    writer
        .into_inner()
        .map_err(|e| FlowError::IoError(e.into_error()))
}

pub fn read_prediction_rows(bytes: &[u8]) -> Result<Vec<PredictionRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);
    let rows = reader
        .deserialize::<PredictionRow>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn prediction_headers() -> Vec<&'static str> {
    let mut headers = REQUIRED_COLUMNS.to_vec();
    headers.extend([
        "Norm_Website_Visits",
        "Norm_Content_Downloads",
        "Norm_Time_Spent",
        "Norm_Actions_Platform",
        "Norm_Event_Attendance",
        "Norm_Product_Trials",
        "Engagement_Score",
        "Seniority Level Code",
        "Industry Code",
        "Funding Stage Code",
        "Predicted Lead Category",
    ]);
    headers
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for LeadScorePipeline<S, C> {
    async fn extract(&self) -> Result<Vec<LeadRecord>> {
        tracing::debug!("Reading leads from: {}", self.config.leads_file());
        let data = self.storage.read_file(self.config.leads_file()).await?;

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(data.as_slice());

        let headers = reader.headers()?.clone();
        if let Some(missing) = REQUIRED_COLUMNS
            .iter()
            .find(|column| !headers.iter().any(|h| h.trim_start_matches('\u{feff}') == **column))
        {
            return Err(FlowError::MissingColumnError {
                column: missing.to_string(),
            });
        }

        let mut records = Vec::new();
        for record in reader.deserialize::<LeadRecord>() {
            records.push(record?);
        }

        if records.is_empty() {
            tracing::warn!("Leads file contains no rows");
        }
        Ok(records)
    }

    async fn transform(&self, data: Vec<LeadRecord>) -> Result<TransformResult> {
        let weights = self.config.engagement_weights();
        let features = preprocess(&data, &weights);
        tracing::debug!("Computed engagement features for {} leads", features.len());

        let encoders = CategoricalEncoders::build(&data, self.config.vocabulary());
        let codes = data
            .iter()
            .map(|record| encoders.encode(record))
            .collect::<Result<Vec<_>>>()?;

        let vectors = features
            .iter()
            .zip(&codes)
            .map(|(f, c)| feature_vector(f, c))
            .collect::<Vec<_>>();

        let classifier = self.load_classifier().await?;
        let predictions = classifier.predict(&vectors)?;

        let mut scored_leads = Vec::with_capacity(data.len());
        for (((record, features), codes), class) in
            data.into_iter().zip(features).zip(codes).zip(predictions)
        {
            let category = LeadCategory::from_class_index(class)
                .ok_or(FlowError::UnknownClassError { index: class })?;
            scored_leads.push(ScoredLead {
                record,
                features,
                codes,
                category,
            });
        }

        let settings = self.config.shortlist();
        let shortlist = shortlist(&scored_leads, &settings);
        tracing::info!(
            "🎯 Shortlisted {} of {} leads predicted '{}'",
            shortlist.len(),
            scored_leads
                .iter()
                .filter(|l| l.category == settings.category)
                .count(),
            settings.category
        );

        Ok(TransformResult {
            scored_leads,
            shortlist,
        })
    }

    async fn load(&self, result: &TransformResult) -> Result<String> {
        let files = self.config.output_files();
        let predictions_path = self.output_file(&files.predictions);
        let shortlist_path = self.output_file(&files.shortlist);

        let predictions_csv = write_csv(&result.scored_leads)?;
        let shortlist_csv = write_csv(&result.shortlist)?;

        tracing::debug!(
            "Writing {} predictions ({} bytes) to {}",
            result.scored_leads.len(),
            predictions_csv.len(),
            predictions_path
        );
        self.storage
            .write_file(&predictions_path, &predictions_csv)
            .await?;
        self.storage
            .write_file(&shortlist_path, &shortlist_csv)
            .await?;

        if let Some(archive) = self.config.archive().filter(|a| a.enabled) {
            // 將兩份 CSV 打包成 ZIP
            let zip_data = {
                let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

                zip.start_file(files.predictions.as_str(), SimpleFileOptions::default())?;
                zip.write_all(&predictions_csv)?;

                zip.start_file(files.shortlist.as_str(), SimpleFileOptions::default())?;
                zip.write_all(&shortlist_csv)?;

                let cursor = zip.finish()?;
                cursor.into_inner()
            };

            let archive_path = self.output_file(&archive.filename);
            tracing::debug!("Writing ZIP archive ({} bytes) to {}", zip_data.len(), archive_path);
            self.storage.write_file(&archive_path, &zip_data).await?;
        }

        Ok(predictions_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::settings::{ArchiveSettings, OutputFiles, ShortlistSettings};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn put(&self, path: &str, data: &str) {
            self.files
                .lock()
                .await
                .insert(path.to_string(), data.as_bytes().to_vec());
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                FlowError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files
                .lock()
                .await
                .insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct TestConfig {
        archive: bool,
    }

    impl ConfigProvider for TestConfig {
        fn leads_file(&self) -> &str {
            "leads.csv"
        }

        fn model_file(&self) -> &str {
            "model.json"
        }

        fn output_path(&self) -> &str {
            "out"
        }

        fn shortlist(&self) -> ShortlistSettings {
            ShortlistSettings::default()
        }

        fn archive(&self) -> Option<ArchiveSettings> {
            self.archive.then(|| ArchiveSettings {
                enabled: true,
                filename: "leads.zip".to_string(),
            })
        }
    }

    const LEADS: &str = "\
Lead ID,First Name,Last Name,Company Name,Website Visits,Content Downloads,Time Spent (mins),Actions on Platform,Event Attendance,Product Trials Initiated,Seniority Level,Industry,Funding Stage
1,Ada,Lovelace,Engines,20,5,120,30,2,True,Director,Fintech,Series A
2,Alan,Turing,Bletchley,10,2,60,10,0,False,Manager,Security,Seed
3,Grace,Hopper,Cobol,5,1,30,5,1,True,VP,Software,Series B
4,Linus,Torvalds,Kernel,15,4,90,25,2,true,Director,Software,Seed
";

    /// class 1 (Easy) 當 Norm_Product_Trials >= 0.5，否則 class 0
    const MODEL: &str = r#"{
        "learner": {
            "learner_model_param": { "base_score": "5E-1", "num_class": "3", "num_feature": "9" },
            "gradient_booster": {
                "name": "gbtree",
                "model": {
                    "tree_info": [0, 1],
                    "trees": [
                        { "left_children": [1, -1, -1], "right_children": [2, -1, -1],
                          "split_indices": [5, 0, 0], "split_conditions": [0.5, 1.0, 0.0],
                          "default_left": [0, 0, 0] },
                        { "left_children": [1, -1, -1], "right_children": [2, -1, -1],
                          "split_indices": [5, 0, 0], "split_conditions": [0.5, 0.0, 1.0],
                          "default_left": [0, 0, 0] }
                    ]
                }
            }
        }
    }"#;

    async fn seeded_storage() -> MockStorage {
        let storage = MockStorage::new();
        storage.put("leads.csv", LEADS).await;
        storage.put("model.json", MODEL).await;
        storage
    }

    #[tokio::test]
    async fn test_extract_reads_all_rows() {
        let pipeline = LeadScorePipeline::new(seeded_storage().await, TestConfig { archive: false });
        let records = pipeline.extract().await.unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(records[0].first_name, "Ada");
        assert!(records[3].product_trials_initiated);
    }

    #[tokio::test]
    async fn test_extract_missing_column() {
        let storage = MockStorage::new();
        storage
            .put("leads.csv", "Lead ID,First Name\n1,Ada\n")
            .await;
        let pipeline = LeadScorePipeline::new(storage, TestConfig { archive: false });

        match pipeline.extract().await {
            Err(FlowError::MissingColumnError { column }) => assert_eq!(column, "Last Name"),
            other => panic!("unexpected result: {:?}", other.map(|r| r.len())),
        }
    }

    #[tokio::test]
    async fn test_transform_predicts_and_shortlists() {
        let pipeline = LeadScorePipeline::new(seeded_storage().await, TestConfig { archive: false });
        let records = pipeline.extract().await.unwrap();
        let result = pipeline.transform(records).await.unwrap();

        let categories: Vec<LeadCategory> =
            result.scored_leads.iter().map(|l| l.category).collect();
        assert_eq!(
            categories,
            vec![
                LeadCategory::Easy,
                LeadCategory::Difficult,
                LeadCategory::Easy,
                LeadCategory::Easy
            ]
        );

        // 依字母排序：Fintech, Security, Software
        assert_eq!(result.scored_leads[0].codes.industry, 0);
        assert_eq!(result.scored_leads[1].codes.industry, 1);
        assert_eq!(result.scored_leads[2].codes.industry, 2);

        let ids: Vec<&str> = result
            .shortlist
            .iter()
            .map(|l| l.record.lead_id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "4", "3"]);
    }

    #[tokio::test]
    async fn test_transform_missing_model() {
        let storage = MockStorage::new();
        storage.put("leads.csv", LEADS).await;
        let pipeline = LeadScorePipeline::new(storage, TestConfig { archive: false });
        let records = pipeline.extract().await.unwrap();

        assert!(matches!(
            pipeline.transform(records).await,
            Err(FlowError::IoError(_))
        ));
    }

    #[tokio::test]
    async fn test_load_writes_predictions_and_shortlist() {
        let storage = seeded_storage().await;
        let pipeline = LeadScorePipeline::new(storage.clone(), TestConfig { archive: true });
        let records = pipeline.extract().await.unwrap();
        let result = pipeline.transform(records).await.unwrap();

        let output = pipeline.load(&result).await.unwrap();
        let files = OutputFiles::default();
        assert_eq!(output, join_path("out", &files.predictions));

        let predictions = storage.get_file(&output).await.unwrap();
        let rows = read_prediction_rows(&predictions).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1].predicted_lead_category, LeadCategory::Difficult);
        assert_eq!(rows[0].norm_website_visits, 1.0);

        let shortlist = storage
            .get_file(&join_path("out", &files.shortlist))
            .await
            .unwrap();
        let shortlist_rows = read_prediction_rows(&shortlist).unwrap();
        assert_eq!(shortlist_rows.len(), 3);
        assert_eq!(shortlist_rows[0].lead_id, "1");

        let zip_data = storage.get_file(&join_path("out", "leads.zip")).await.unwrap();
        let archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
        assert_eq!(archive.len(), 2);
    }

    #[test]
    fn test_empty_csv_has_headers() {
        let bytes = write_csv(&[]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("Lead ID,First Name"));
        assert!(text.trim_end().ends_with("Predicted Lead Category"));
    }
}
