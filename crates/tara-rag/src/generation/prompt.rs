//! Prompt templates for narrative answers and tabular analysis

use crate::conversation::{ConversationMemory, Role, Turn};
use crate::error::Result;
use crate::retrieval::SearchHit;
use crate::tabular::TabularDataset;

/// Prompt builder for narrative and analysis requests
pub struct PromptBuilder;

impl PromptBuilder {
    /// Prefix the role instructions to the user's question
    pub fn enhanced_question(role: Role, question: &str) -> String {
        format!("{}\n\nUser question: {}", role.instructions(), question)
    }

    /// Build context from search results
    pub fn build_context(hits: &[SearchHit]) -> String {
        hits.iter()
            .map(|hit| hit.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Full narrative prompt: retrieved context, prior turns and the role-framed question
    pub fn build_answer_prompt(question: &str, context: &str, history: &[Turn]) -> String {
        let history = if history.is_empty() {
            String::new()
        } else {
            format!(
                "\nConversation so far:\n{}\n",
                ConversationMemory::transcript(history)
            )
        };

        format!(
            r#"Use the following pieces of context to answer the question at the end. If you don't know the answer, just say that you don't know, don't try to make up an answer.

{context}
{history}
Question: {question}
Helpful Answer:"#,
            context = context,
            history = history,
            question = question
        )
    }

    /// Rewrite a follow-up into a standalone question
    pub fn build_condense_prompt(question: &str, history: &[Turn]) -> String {
        format!(
            r#"Given the following conversation and a follow up question, rephrase the follow up question to be a standalone question, in its original language.

Chat History:
{history}
Follow Up Input: {question}
Standalone question:"#,
            history = ConversationMemory::transcript(history),
            question = question
        )
    }

    /// Single-turn analysis prompt carrying every dataset in full
    pub fn build_analysis_prompt<'a>(
        question: &str,
        datasets: impl IntoIterator<Item = &'a TabularDataset>,
    ) -> Result<String> {
        let mut data = String::new();

        for dataset in datasets {
            let (rows, cols) = dataset.shape();
            let dtypes = serde_json::to_string(&dataset.dtypes())?;
            data.push_str(&format!(
                r#"
File: {filename}
Shape: {rows} rows, {cols} columns
Columns: {columns}
Column types: {dtypes}

CSV DATA:
{csv}
"#,
                filename = dataset.filename(),
                rows = rows,
                cols = cols,
                columns = dataset.column_names().join(", "),
                dtypes = dtypes,
                csv = dataset.to_csv()?
            ));
        }

        Ok(format!(
            r#"You are an expert data analyst assistant. Analyze the following tabular data based on the user's query.

DATA:
{data}

USER QUERY:
{question}

Please provide a detailed analysis with relevant statistics, insights, and explanations. If the query involves calculations, perform them accurately and show your work. If appropriate, describe what visualizations would be helpful for this data.
"#,
            data = data,
            question = question
        ))
    }
}
