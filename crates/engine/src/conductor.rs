//! The Conductor: top-level dispatch with retrieval injection.
//!
//! Accepts any [`GenerationRequest`]. Instructions that ask for injection
//! get their context from the document store first: the query is rendered
//! without context, used to search the store, and the matching documents
//! (joined by newlines) become the context of a resolved copy of the
//! instruction. Retrieval never fails a request; a store error or an empty
//! result just leaves the context empty.

use std::borrow::Cow;
use std::sync::Arc;

use baton_core::chain::Chain;
use baton_core::document::{DEFAULT_COLLECTION, DocumentQuery, DocumentStore};
use baton_core::error::Result;
use baton_core::instruction::Instruction;
use baton_core::options::Options;
use baton_core::prompt::{Params, Prompt};
use baton_core::reply::Reply;
use tracing::{debug, warn};

use crate::generator::{Generator, run_chain};

/// Everything the conductor knows how to generate from.
#[derive(Debug, Clone)]
pub enum GenerationRequest {
    Text(String),
    Prompt(Prompt),
    Instruction(Instruction),
    Chain(Chain),
}

impl From<&str> for GenerationRequest {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for GenerationRequest {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Prompt> for GenerationRequest {
    fn from(prompt: Prompt) -> Self {
        Self::Prompt(prompt)
    }
}

impl From<Instruction> for GenerationRequest {
    fn from(instruction: Instruction) -> Self {
        Self::Instruction(instruction)
    }
}

impl From<Chain> for GenerationRequest {
    fn from(chain: Chain) -> Self {
        Self::Chain(chain)
    }
}

pub struct Conductor {
    generator: Generator,
    documents: Arc<dyn DocumentStore>,
    /// Collection searched for injected context
    collection: String,
}

impl Conductor {
    pub fn new(generator: Generator, documents: Arc<dyn DocumentStore>) -> Self {
        Self {
            generator,
            documents,
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    pub fn documents(&self) -> &Arc<dyn DocumentStore> {
        &self.documents
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Generate a reply for any kind of request.
    pub async fn generate(
        &self,
        request: impl Into<GenerationRequest>,
        options: Option<&Options>,
        params: &Params,
    ) -> Result<Reply> {
        match request.into() {
            GenerationRequest::Text(text) => {
                self.generator.generate_from_text(&text, options).await
            }
            GenerationRequest::Prompt(prompt) => {
                self.generator
                    .generate_from_prompt(&prompt, options, params)
                    .await
            }
            GenerationRequest::Instruction(instruction) => {
                self.generate_instruction(&instruction, options, params)
                    .await
            }
            GenerationRequest::Chain(chain) => self.generate_chain(&chain, options, params).await,
        }
    }

    async fn generate_instruction(
        &self,
        instruction: &Instruction,
        options: Option<&Options>,
        params: &Params,
    ) -> Result<Reply> {
        let resolved = self.resolve(instruction, params).await?;
        self.generator
            .generate_from_instruction(&resolved, options, params)
            .await
    }

    /// Like [`Generator::generate_from_chain`], with injection resolved per
    /// step against that step's parameters.
    async fn generate_chain(
        &self,
        chain: &Chain,
        options: Option<&Options>,
        params: &Params,
    ) -> Result<Reply> {
        run_chain(chain, params, async |instruction: &Instruction, step_params: &Params| {
            self.generate_instruction(instruction, options, step_params).await
        })
        .await
    }

    /// The instruction as it will be rendered: unchanged without injection,
    /// otherwise a copy whose context holds the retrieved documents.
    pub async fn resolve<'a>(
        &self,
        instruction: &'a Instruction,
        params: &Params,
    ) -> Result<Cow<'a, Instruction>> {
        let Some(inject) = instruction.inject else {
            return Ok(Cow::Borrowed(instruction));
        };

        let query = instruction.render_query(params)?;
        let context = self.retrieve(&query, inject.result_count).await;
        Ok(Cow::Owned(instruction.with_retrieved_context(context)))
    }

    async fn retrieve(&self, query: &str, result_count: usize) -> String {
        let request = DocumentQuery::text(query)
            .with_result_count(result_count)
            .in_collection(&self.collection);

        match self.documents.query(request).await {
            Ok(documents) => {
                debug!(
                    store = %self.documents.name(),
                    collection = %self.collection,
                    count = documents.len(),
                    "Retrieved context documents"
                );
                documents
                    .iter()
                    .map(|d| d.content.as_str())
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            Err(e) => {
                warn!(
                    store = %self.documents.name(),
                    error = %e,
                    "Document retrieval failed, continuing without context"
                );
                String::new()
            }
        }
    }
}
