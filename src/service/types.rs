//! Backend payload types.
//!
//! Fields default when absent; the backend is not strict about optional data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cargo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bloco: Option<String>,
    pub level: u32,
    pub xp: u64,
    pub accuracy: f64,
    pub plan: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Returned by login and signup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthPayload {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cargo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bloco: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub subject: String,
    pub topic: String,
    pub difficulty: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: u32,
    pub explanation: String,
    pub source: String,
}

/// Parameters for question generation; unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bloco: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cargo: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationResult {
    pub id: String,
    pub user_id: String,
    pub questions: Vec<Question>,
    pub answers: Vec<u32>,
    pub score: f64,
    pub accuracy: f64,
    pub time_spent: u64,
    pub completed_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubjectPerformance {
    pub total: u32,
    pub correct: u32,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProgressPoint {
    #[serde(alias = "month")]
    pub week: String,
    pub questions_answered: u32,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Performance {
    pub user_id: String,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub accuracy: f64,
    pub average_time: f64,
    pub subject_performance: BTreeMap<String, SubjectPerformance>,
    pub weekly_progress: Vec<ProgressPoint>,
    pub monthly_progress: Vec<ProgressPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Plan {
    pub id: String,
    pub nome: String,
    pub descricao: String,
    pub preco: f64,
    pub periodo: String,
    pub duracao: String,
    pub recursos: Vec<String>,
    pub tipo: String,
    pub popular: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RankingEntry {
    pub position: u32,
    pub user_id: String,
    pub user_name: String,
    pub level: u32,
    pub xp: u64,
    pub accuracy: f64,
    pub questions_answered: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct News {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub source: String,
    pub published_at: String,
    pub category: String,
}

/// Checkout link for a plan purchase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentLink {
    #[serde(alias = "init_point", rename = "paymentUrl")]
    pub payment_url: String,
}

/// Positions, study blocks and the blocks available to each position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsData {
    #[serde(alias = "todos_cargos")]
    pub positions: Vec<String>,
    #[serde(alias = "todos_blocos")]
    pub blocks: Vec<String>,
    #[serde(alias = "cargos_blocos", skip_serializing_if = "BTreeMap::is_empty")]
    pub blocks_by_position: BTreeMap<String, Vec<String>>,
    #[serde(alias = "blocos_cargos", skip_serializing_if = "BTreeMap::is_empty")]
    pub positions_by_block: BTreeMap<String, Vec<String>>,
}

impl OptionsData {
    /// Blocks for `position`, if the backend listed any.
    pub fn blocks_for(&self, position: &str) -> Option<&[String]> {
        self.blocks_by_position.get(position).map(Vec::as_slice)
    }

    pub fn positions_for(&self, block: &str) -> Option<&[String]> {
        self.positions_by_block.get(block).map(Vec::as_slice)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionBlocks {
    pub cargo: String,
    pub blocos: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockPositions {
    pub bloco: String,
    pub cargos: Vec<String>,
}

/// Free-form enrichment content (study tips, key points, further topics, chat).
pub type Enrichment = Value;
