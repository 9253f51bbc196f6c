use std::collections::HashMap;
use std::future::ready;

use duck_chat_model::{FunctionCall, FunctionDescriptor};
use serde_json::json;

use super::{
    AnyFunction, BoxedFunctionFuture, Error, Function, FunctionObject,
};

/// Name of the function that ends the conversation.
///
/// It has no handler, the session recognizes the name and ends itself.
pub const EXIT_CONVERSATION: &str = "exit_conversation";

enum Entry {
    Bound(Box<dyn FunctionObject>),
    Exit,
}

/// What the session should do for a function name.
pub(crate) enum Dispatch<'a> {
    Call(&'a dyn FunctionObject),
    Exit,
}

/// [`Registry`] builder.
#[derive(Default)]
pub struct RegistryBuilder {
    entries: Vec<(FunctionDescriptor, Entry)>,
}

impl RegistryBuilder {
    /// Creates an empty builder.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a function.
    ///
    /// A function registered under an existing name replaces the previous
    /// one and keeps its position.
    pub fn with_function<F: Function>(self, function: F) -> Self {
        let function = AnyFunction(function);
        self.insert(function.descriptor(), Entry::Bound(Box::new(function)))
    }

    /// Registers the [`EXIT_CONVERSATION`] function.
    pub fn with_exit_conversation(self) -> Self {
        let descriptor = FunctionDescriptor {
            name: EXIT_CONVERSATION.to_owned(),
            description: "Exit the conversation".to_owned(),
            parameters: json!({
                "type": "object",
                "properties": {}
            }),
        };
        self.insert(descriptor, Entry::Exit)
    }

    fn insert(mut self, descriptor: FunctionDescriptor, entry: Entry) -> Self {
        let existing = self
            .entries
            .iter_mut()
            .find(|(d, _)| d.name == descriptor.name);
        match existing {
            Some(slot) => {
                warn!("function `{}` is registered twice", descriptor.name);
                *slot = (descriptor, entry);
            }
            None => self.entries.push((descriptor, entry)),
        }
        self
    }

    /// Builds the registry.
    pub fn build(self) -> Registry {
        let index = self
            .entries
            .iter()
            .enumerate()
            .map(|(idx, (descriptor, _))| (descriptor.name.clone(), idx))
            .collect();
        Registry {
            entries: self.entries,
            index,
        }
    }
}

/// An immutable set of functions available to the model.
///
/// Build it once at startup and share it with an `Arc`.
pub struct Registry {
    entries: Vec<(FunctionDescriptor, Entry)>,
    index: HashMap<String, usize>,
}

impl Registry {
    /// Creates a builder.
    #[inline]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Returns the descriptors in registration order.
    pub fn descriptors(&self) -> Vec<FunctionDescriptor> {
        self.entries
            .iter()
            .map(|(descriptor, _)| descriptor.clone())
            .collect()
    }

    /// Returns whether a function is registered under `name`.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns the number of registered functions.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no function is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn dispatch(&self, name: &str) -> Option<Dispatch<'_>> {
        let idx = *self.index.get(name)?;
        Some(match &self.entries[idx].1 {
            Entry::Bound(function) => Dispatch::Call(function.as_ref()),
            Entry::Exit => Dispatch::Exit,
        })
    }

    /// Calls the function named in `call` with its decoded arguments.
    ///
    /// Fails with [`ErrorKind::NotFound`](super::ErrorKind::NotFound) if the
    /// name is unknown or has no handler.
    pub fn invoke(&self, call: &FunctionCall) -> BoxedFunctionFuture {
        let _span = debug_span!("function registry").entered();
        match self.dispatch(&call.name) {
            Some(Dispatch::Call(function)) => {
                trace!("invoking `{}` with {}", call.name, call.arguments);
                super::call(function, call)
            }
            Some(Dispatch::Exit) => Box::pin(ready(Err(Error::not_found()
                .with_reason(format!("`{}` has no handler", call.name))))),
            None => {
                warn!("function not found: {}", call.name);
                Box::pin(ready(Err(Error::not_found()
                    .with_reason(format!("unknown function `{}`", call.name)))))
            }
        }
    }
}
