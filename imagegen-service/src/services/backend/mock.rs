//! Mock backend for testing.

use super::{
    BackendError, Conversation, Fragment, GenerationRequest, ImageBackend, Role,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted backend: returns a fixed fragment list for every call unless a
/// one-shot response has been queued, and records each instruction it sees.
pub struct MockImageBackend {
    default_fragments: Vec<Fragment>,
    queued: Mutex<VecDeque<Result<Vec<Fragment>, BackendError>>>,
    instructions: Mutex<Vec<String>>,
}

impl MockImageBackend {
    pub fn returning(default_fragments: Vec<Fragment>) -> Self {
        Self {
            default_fragments,
            queued: Mutex::new(VecDeque::new()),
            instructions: Mutex::new(Vec::new()),
        }
    }

    /// Queue a one-shot response consumed before the default fragments.
    pub fn enqueue(&self, response: Result<Vec<Fragment>, BackendError>) {
        self.queued.lock().unwrap().push_back(response);
    }

    /// Instructions received so far, in call order.
    pub fn recorded_instructions(&self) -> Vec<String> {
        self.instructions.lock().unwrap().clone()
    }

    fn respond(&self, request: &GenerationRequest) -> Result<Vec<Fragment>, BackendError> {
        self.instructions
            .lock()
            .unwrap()
            .push(request.instruction.clone());

        match self.queued.lock().unwrap().pop_front() {
            Some(response) => response,
            None => Ok(self.default_fragments.clone()),
        }
    }
}

#[async_trait]
impl ImageBackend for MockImageBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Fragment>, BackendError> {
        self.respond(request)
    }

    async fn open_conversation(
        &self,
        model: &str,
        system_instruction: Option<&str>,
    ) -> Result<Conversation, BackendError> {
        match self.queued.lock().unwrap().pop_front() {
            Some(Err(err)) => Err(err),
            _ => Ok(Conversation::new(model, system_instruction.map(String::from))),
        }
    }

    async fn converse(
        &self,
        conversation: &mut Conversation,
        request: &GenerationRequest,
    ) -> Result<Vec<Fragment>, BackendError> {
        let fragments = self.respond(request)?;
        conversation.push_turn(Role::User, vec![Fragment::Text(request.instruction.clone())]);
        conversation.push_turn(Role::Model, fragments.clone());
        Ok(fragments)
    }
}
