//! Functions the model can call.

mod error;
mod registry;

use std::future::ready;
use std::pin::Pin;

use duck_chat_model::{FunctionCall, FunctionDescriptor};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use error::{Error, ErrorKind};
pub(crate) use registry::Dispatch;
pub use registry::{EXIT_CONVERSATION, Registry, RegistryBuilder};

/// The result of a function call.
pub type FunctionResult = Result<String, Error>;

type BoxedFunctionFuture = Pin<Box<dyn Future<Output = FunctionResult> + Send>>;

/// A function that can be called by the model.
///
/// Implementations of this trait should be stateless, and may not maintain
/// any internal state. Shared context, like a search client, should be an
/// immutable part of the function set during initialization.
pub trait Function: Send + Sync + 'static {
    /// The type of input that the function accepts.
    ///
    /// Arguments from the model are decoded into this type before
    /// [`Function::execute`] is called. Decoding failures never reach the
    /// function.
    type Input: DeserializeOwned;

    /// Returns the name of the function.
    fn name(&self) -> &str;

    /// Returns the description of the function.
    fn description(&self) -> &str;

    /// Returns the parameter schema of the function.
    fn parameter_schema(&self) -> &Value;

    /// Executes the function with the given input.
    ///
    /// This method must return a future that is fully independent of `self`.
    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = FunctionResult> + Send + 'static;
}

pub(crate) trait FunctionObject: Send + Sync + 'static {
    fn descriptor(&self) -> FunctionDescriptor;

    fn execute(&self, arguments: Value) -> BoxedFunctionFuture;
}

pub(crate) struct AnyFunction<F: Function>(pub F);

impl<F: Function> FunctionObject for AnyFunction<F> {
    #[inline]
    fn descriptor(&self) -> FunctionDescriptor {
        FunctionDescriptor {
            name: self.0.name().to_owned(),
            description: self.0.description().to_owned(),
            parameters: self.0.parameter_schema().clone(),
        }
    }

    #[inline]
    fn execute(&self, arguments: Value) -> BoxedFunctionFuture {
        let input: F::Input = match serde_json::from_value(arguments) {
            Ok(input) => input,
            Err(err) => {
                let reason = format!("{err}");
                return Box::pin(ready(FunctionResult::Err(
                    Error::invalid_input().with_reason(reason),
                )));
            }
        };
        Box::pin(self.0.execute(input))
    }
}

/// Decodes the arguments of `call` and runs it.
pub(crate) fn call(
    function: &dyn FunctionObject,
    call: &FunctionCall,
) -> BoxedFunctionFuture {
    match call.decode_arguments() {
        Ok(arguments) => function.execute(arguments),
        Err(err) => Box::pin(ready(Err(Error::invalid_input()
            .with_reason(format!("arguments are not valid JSON: {err}"))))),
    }
}
