use lambdaup_core::contract::{CreateFunction, UpdateFunctionCode};
use lambdaup_core::registry::FunctionListPage;

pub trait FunctionRegistry {
    /// Fetches one page of deployed functions, starting at `marker`.
    fn list_functions_page(&self, marker: Option<&str>) -> Result<FunctionListPage, String>;
}

/// Create and update calls. Responses are returned as opaque text.
pub trait FunctionWriter {
    fn create_function(&self, request: &CreateFunction) -> Result<String, String>;

    fn update_function_code(&self, request: &UpdateFunctionCode) -> Result<String, String>;
}
