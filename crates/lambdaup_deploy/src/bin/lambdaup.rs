use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::process::exit;

use aws_sdk_lambda::types::{FunctionCode, Runtime};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use clap::builder::NonEmptyStringValueParser;
use clap::Parser;
use lambdaup_core::contract::{
    CreateFunction, PackageLocation, TransferProgress, UpdateFunctionCode,
};
use lambdaup_core::descriptor::{ProjectDescriptor, RoleDirectory};
use lambdaup_core::registry::{FunctionListPage, RemoteFunction};
use lambdaup_deploy::adapters::archiver::ZipArchiver;
use lambdaup_deploy::adapters::compiler::GoToolchain;
use lambdaup_deploy::adapters::object_store::{
    upload_in_parts, PackageStore, PartUploader, UploadedPart, MIN_PART_SIZE,
};
use lambdaup_deploy::adapters::registry::{FunctionRegistry, FunctionWriter};
use lambdaup_deploy::error::DeployError;
use lambdaup_deploy::handlers::deploy::{deploy_function, DeployConfig, DeployDependencies};
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "lambdaup",
    about = "Build, upload and create or update a Lambda function",
    version
)]
struct Cli {
    /// Name of the function, without the project prefix
    #[arg(
        short = 'n',
        long = "name",
        env = "LAMBDAUP_FUNCTION",
        value_parser = NonEmptyStringValueParser::new()
    )]
    name: String,
    /// Location of the project descriptor
    #[arg(
        short = 'c',
        long = "config",
        env = "LAMBDAUP_CONFIG",
        default_value = "project.json"
    )]
    config: PathBuf,
}

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

struct IamRoleDirectory {
    iam_client: aws_sdk_iam::Client,
}

impl RoleDirectory for IamRoleDirectory {
    fn role_arns(&self) -> Result<HashMap<String, String>, String> {
        let mut roles = HashMap::new();
        let mut marker: Option<String> = None;

        loop {
            let output = block_on(self.iam_client.list_roles().set_marker(marker.take()).send())
                .map_err(|error| format!("failed to list iam roles: {error}"))?;
            for role in output.roles() {
                roles.insert(role.role_name().to_string(), role.arn().to_string());
            }
            if !output.is_truncated() {
                break;
            }
            match output.marker() {
                Some(next) => marker = Some(next.to_string()),
                None => break,
            }
        }

        Ok(roles)
    }
}

struct S3PackageStore {
    s3_client: aws_sdk_s3::Client,
}

impl PartUploader for S3PackageStore {
    fn put_object(&self, location: &PackageLocation, body: Vec<u8>) -> Result<(), String> {
        block_on(
            self.s3_client
                .put_object()
                .bucket(location.bucket.as_str())
                .key(location.key.as_str())
                .body(ByteStream::from(body))
                .send(),
        )
        .map(|_| ())
        .map_err(|error| format!("failed to write object to s3: {error}"))
    }

    fn start_upload(&self, location: &PackageLocation) -> Result<String, String> {
        let output = block_on(
            self.s3_client
                .create_multipart_upload()
                .bucket(location.bucket.as_str())
                .key(location.key.as_str())
                .send(),
        )
        .map_err(|error| format!("failed to start multipart upload: {error}"))?;
        output
            .upload_id()
            .map(str::to_string)
            .ok_or_else(|| "multipart upload returned no upload id".to_string())
    }

    fn upload_part(
        &self,
        location: &PackageLocation,
        upload_id: &str,
        part_number: i32,
        body: Vec<u8>,
    ) -> Result<UploadedPart, String> {
        let output = block_on(
            self.s3_client
                .upload_part()
                .bucket(location.bucket.as_str())
                .key(location.key.as_str())
                .upload_id(upload_id)
                .part_number(part_number)
                .body(ByteStream::from(body))
                .send(),
        )
        .map_err(|error| format!("failed to upload part {part_number}: {error}"))?;
        Ok(UploadedPart {
            part_number,
            e_tag: output.e_tag().map(str::to_string),
        })
    }

    fn complete_upload(
        &self,
        location: &PackageLocation,
        upload_id: &str,
        parts: Vec<UploadedPart>,
    ) -> Result<(), String> {
        let completed = parts
            .into_iter()
            .map(|part| {
                CompletedPart::builder()
                    .set_e_tag(part.e_tag)
                    .part_number(part.part_number)
                    .build()
            })
            .collect();
        block_on(
            self.s3_client
                .complete_multipart_upload()
                .bucket(location.bucket.as_str())
                .key(location.key.as_str())
                .upload_id(upload_id)
                .multipart_upload(
                    CompletedMultipartUpload::builder()
                        .set_parts(Some(completed))
                        .build(),
                )
                .send(),
        )
        .map(|_| ())
        .map_err(|error| format!("failed to complete multipart upload: {error}"))
    }

    fn abort_upload(&self, location: &PackageLocation, upload_id: &str) -> Result<(), String> {
        block_on(
            self.s3_client
                .abort_multipart_upload()
                .bucket(location.bucket.as_str())
                .key(location.key.as_str())
                .upload_id(upload_id)
                .send(),
        )
        .map(|_| ())
        .map_err(|error| format!("failed to abort multipart upload: {error}"))
    }
}

impl PackageStore for S3PackageStore {
    fn put_package(
        &self,
        package: &Path,
        location: &PackageLocation,
        on_progress: &mut dyn FnMut(TransferProgress),
    ) -> Result<(), String> {
        upload_in_parts(self, package, location, MIN_PART_SIZE, on_progress)
    }
}

struct AwsFunctionApi {
    lambda_client: aws_sdk_lambda::Client,
}

// Create and update outputs share the function configuration getters but not
// a type.
macro_rules! function_configuration_json {
    ($output:expr) => {{
        let output = $output;
        json!({
            "FunctionName": output.function_name(),
            "FunctionArn": output.function_arn(),
            "Runtime": output.runtime().map(|runtime| runtime.as_str()),
            "Role": output.role(),
            "Handler": output.handler(),
            "CodeSize": output.code_size(),
            "CodeSha256": output.code_sha256(),
            "LastModified": output.last_modified(),
            "Version": output.version(),
            "State": output.state().map(|state| state.as_str()),
        })
    }};
}

impl FunctionRegistry for AwsFunctionApi {
    fn list_functions_page(&self, marker: Option<&str>) -> Result<FunctionListPage, String> {
        let output = block_on(
            self.lambda_client
                .list_functions()
                .set_marker(marker.map(str::to_string))
                .send(),
        )
        .map_err(|error| format!("failed to list lambda functions: {error}"))?;

        Ok(FunctionListPage {
            functions: output
                .functions()
                .iter()
                .filter_map(|function| function.function_name())
                .map(|name| RemoteFunction {
                    function_name: name.to_string(),
                })
                .collect(),
            next_marker: output.next_marker().map(str::to_string),
        })
    }
}

impl FunctionWriter for AwsFunctionApi {
    fn create_function(&self, request: &CreateFunction) -> Result<String, String> {
        let code = FunctionCode::builder()
            .s3_bucket(request.code.bucket.as_str())
            .s3_key(request.code.key.as_str())
            .build();

        let output = block_on(
            self.lambda_client
                .create_function()
                .function_name(request.function_name.as_str())
                .runtime(Runtime::from(request.runtime.as_str()))
                .role(request.role.as_str())
                .handler(request.handler.as_str())
                .code(code)
                .send(),
        )
        .map_err(|error| format!("failed to create lambda function: {error}"))?;

        Ok(format!("{:#}", function_configuration_json!(&output)))
    }

    fn update_function_code(&self, request: &UpdateFunctionCode) -> Result<String, String> {
        let output = block_on(
            self.lambda_client
                .update_function_code()
                .function_name(request.function_name.as_str())
                .s3_bucket(request.code.bucket.as_str())
                .s3_key(request.code.key.as_str())
                .send(),
        )
        .map_err(|error| format!("failed to update lambda function code: {error}"))?;

        Ok(format!("{:#}", function_configuration_json!(&output)))
    }
}

/// `RUST_LOG` when set, `info` otherwise.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn fail(error: DeployError) -> ! {
    error!(stage = %error.stage(), code = error.stage().code(), "{error}");
    exit(1)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

    let roles = IamRoleDirectory {
        iam_client: aws_sdk_iam::Client::new(&aws_config),
    };
    let descriptor = match ProjectDescriptor::load(&cli.config, &roles) {
        Ok(descriptor) => descriptor,
        Err(error) => fail(DeployError::from(error)),
    };

    let toolchain = GoToolchain::default();
    let store = S3PackageStore {
        s3_client: aws_sdk_s3::Client::new(&aws_config),
    };
    let functions = AwsFunctionApi {
        lambda_client: aws_sdk_lambda::Client::new(&aws_config),
    };
    let deps = DeployDependencies {
        compiler: &toolchain,
        archiver: &ZipArchiver,
        store: &store,
        registry: &functions,
        functions: &functions,
    };

    let mut stdout = io::stdout().lock();
    match deploy_function(
        &descriptor,
        &cli.name,
        &DeployConfig::default(),
        deps,
        &mut stdout,
    ) {
        Ok(outcome) => info!(
            function = %outcome.function_name,
            action = %outcome.action,
            package = %outcome.package,
            "deployment complete"
        ),
        Err(error) => fail(error),
    }
}
