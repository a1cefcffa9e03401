//! 預先訓練好的梯度提升樹分類器。
//!
//! 讀取 XGBoost `save_model("model.json")` 輸出的 JSON 格式（僅 `gbtree`），
//! 在本地逐棵樹走訪求值，不需要 Python 執行環境。

use crate::domain::model::FeatureVector;
use crate::domain::ports::LeadClassifier;
use crate::utils::error::{FlowError, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ModelFile {
    learner: Learner,
}

#[derive(Debug, Deserialize)]
struct Learner {
    learner_model_param: LearnerModelParam,
    gradient_booster: GradientBooster,
    #[serde(default)]
    objective: Option<Objective>,
}

#[derive(Debug, Deserialize)]
struct LearnerModelParam {
    base_score: String,
    #[serde(default)]
    num_class: Option<String>,
    num_feature: String,
}

#[derive(Debug, Deserialize)]
struct Objective {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GradientBooster {
    name: String,
    #[serde(default)]
    model: Option<TreeModel>,
}

#[derive(Debug, Deserialize)]
struct TreeModel {
    trees: Vec<RawTree>,
    tree_info: Vec<usize>,
}

#[derive(Debug, Deserialize)]
struct RawTree {
    left_children: Vec<i64>,
    right_children: Vec<i64>,
    split_indices: Vec<usize>,
    split_conditions: Vec<f32>,
    default_left: Vec<Flag>,
}

/// 不同版本的 XGBoost 以 0/1 或 true/false 輸出
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(u8),
}

impl Flag {
    fn is_set(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
        default_left: bool,
    },
    Leaf(f32),
}

#[derive(Debug, Clone, PartialEq)]
struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    fn from_raw(index: usize, raw: RawTree, num_features: usize) -> Result<Self> {
        let len = raw.left_children.len();
        if len == 0
            || raw.right_children.len() != len
            || raw.split_indices.len() != len
            || raw.split_conditions.len() != len
            || raw.default_left.len() != len
        {
            return Err(model_error(format!(
                "tree {} has inconsistent node arrays",
                index
            )));
        }

        let mut nodes = Vec::with_capacity(len);
        for n in 0..len {
            let (left, right) = (raw.left_children[n], raw.right_children[n]);
            if left == -1 {
                nodes.push(Node::Leaf(raw.split_conditions[n]));
                continue;
            }

            // 子節點一定排在父節點之後，保證走訪會結束
            let child = |c: i64| -> Result<usize> {
                usize::try_from(c)
                    .ok()
                    .filter(|&c| c > n && c < len)
                    .ok_or_else(|| {
                        model_error(format!("tree {} node {} has invalid child {}", index, n, c))
                    })
            };
            let feature = raw.split_indices[n];
            if feature >= num_features {
                return Err(model_error(format!(
                    "tree {} node {} splits on feature {} but the model has {} features",
                    index, n, feature, num_features
                )));
            }

            nodes.push(Node::Split {
                feature,
                threshold: raw.split_conditions[n],
                left: child(left)?,
                right: child(right)?,
                default_left: raw.default_left[n].is_set(),
            });
        }

        Ok(Self { nodes })
    }

    /// 與 XGBoost 相同：特徵先轉為 f32 再與門檻比較
    fn leaf_value(&self, row: &[f64]) -> f32 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf(value) => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                } => {
                    let value = row[*feature] as f32;
                    index = if value.is_nan() {
                        if *default_left {
                            *left
                        } else {
                            *right
                        }
                    } else if value < *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeEnsembleClassifier {
    trees: Vec<RegressionTree>,
    tree_groups: Vec<usize>,
    base_margin: Vec<f32>,
    num_features: usize,
}

impl TreeEnsembleClassifier {
    /// 從 XGBoost JSON 內容載入並驗證模型
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let file: ModelFile = serde_json::from_slice(bytes)
            .map_err(|e| model_error(format!("invalid model JSON: {}", e)))?;
        let learner = file.learner;

        if learner.gradient_booster.name != "gbtree" {
            return Err(model_error(format!(
                "unsupported booster '{}', only gbtree is supported",
                learner.gradient_booster.name
            )));
        }
        let model = learner
            .gradient_booster
            .model
            .ok_or_else(|| model_error("gradient_booster.model is missing".to_string()))?;

        let param = &learner.learner_model_param;
        let num_features: usize = param
            .num_feature
            .trim()
            .parse()
            .map_err(|_| model_error(format!("invalid num_feature '{}'", param.num_feature)))?;
        let num_class: usize = match param.num_class.as_deref() {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| model_error(format!("invalid num_class '{}'", raw)))?,
            None => 0,
        };
        let groups = num_class.max(1);

        if model.tree_info.len() != model.trees.len() {
            return Err(model_error(format!(
                "tree_info has {} entries for {} trees",
                model.tree_info.len(),
                model.trees.len()
            )));
        }
        if let Some(group) = model.tree_info.iter().find(|&&g| g >= groups) {
            return Err(model_error(format!(
                "tree assigned to class {} but the model has {} classes",
                group, groups
            )));
        }

        let logistic = learner
            .objective
            .as_ref()
            .map(|o| o.name.starts_with("binary:logistic") || o.name == "reg:logistic")
            .unwrap_or(false);
        let base_margin = parse_base_score(&param.base_score, groups, logistic)?;

        let trees = model
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, raw)| RegressionTree::from_raw(i, raw, num_features))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            "Loaded tree ensemble: {} trees, {} classes, {} features",
            trees.len(),
            groups,
            num_features
        );

        Ok(Self {
            trees,
            tree_groups: model.tree_info,
            base_margin,
            num_features,
        })
    }

    pub fn num_classes(&self) -> usize {
        self.base_margin.len()
    }

    /// 每個類別的原始 margin，以 f32 累加
    pub fn margins(&self, row: &[f64]) -> Result<Vec<f32>> {
        if row.len() != self.num_features {
            return Err(FlowError::FeatureMismatchError {
                expected: self.num_features,
                actual: row.len(),
            });
        }
        let mut margins = self.base_margin.clone();
        for (tree, &group) in self.trees.iter().zip(&self.tree_groups) {
            margins[group] += tree.leaf_value(row);
        }
        Ok(margins)
    }

    pub fn predict_row(&self, row: &[f64]) -> Result<usize> {
        let margins = self.margins(row)?;
        if margins.len() == 1 {
            return Ok(usize::from(margins[0] > 0.0));
        }
        // 同分時取編號較小的類別
        let mut best = 0;
        for (class, margin) in margins.iter().enumerate().skip(1) {
            if *margin > margins[best] {
                best = class;
            }
        }
        Ok(best)
    }
}

impl LeadClassifier for TreeEnsembleClassifier {
    fn num_features(&self) -> usize {
        self.num_features
    }

    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<usize>> {
        rows.iter().map(|row| self.predict_row(row)).collect()
    }
}

/// `base_score` 可能是單一數值（"5E-1"）或每類一個值（"[5E-1,5E-1]"）
fn parse_base_score(raw: &str, groups: usize, logistic: bool) -> Result<Vec<f32>> {
    let values = raw
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .map_err(|_| model_error(format!("invalid base_score '{}'", raw)))
        })
        .collect::<Result<Vec<_>>>()?;

    let to_margin = |p: f64| {
        let margin = if logistic {
            let p = p.clamp(1e-16, 1.0 - 1e-16);
            (p / (1.0 - p)).ln()
        } else {
            p
        };
        margin as f32
    };

    match values.len() {
        1 => Ok(vec![to_margin(values[0]); groups]),
        n if n == groups => Ok(values.into_iter().map(to_margin).collect()),
        n => Err(model_error(format!(
            "base_score has {} values for {} classes",
            n, groups
        ))),
    }
}

fn model_error(message: String) -> FlowError {
    FlowError::ModelError { message }
}
