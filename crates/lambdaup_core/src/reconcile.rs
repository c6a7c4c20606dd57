use crate::contract::{CreateFunction, DeployAction, PackageLocation, UpdateFunctionCode};
use crate::descriptor::ProjectDescriptor;
use crate::naming::remote_function_name;
use crate::registry::RemoteFunctionSet;

/// The single remote call a deployment ends with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcilePlan {
    Create(CreateFunction),
    Update(UpdateFunctionCode),
}

impl ReconcilePlan {
    pub fn action(&self) -> DeployAction {
        match self {
            Self::Create(_) => DeployAction::Create,
            Self::Update(_) => DeployAction::Update,
        }
    }

    pub fn function_name(&self) -> &str {
        match self {
            Self::Create(request) => &request.function_name,
            Self::Update(request) => &request.function_name,
        }
    }

    pub fn code(&self) -> &PackageLocation {
        match self {
            Self::Create(request) => &request.code,
            Self::Update(request) => &request.code,
        }
    }
}

/// Updates the function when the snapshot already lists it, creates it
/// otherwise. `code` is the package that was just published.
pub fn plan_reconcile(
    descriptor: &ProjectDescriptor,
    base_name: &str,
    snapshot: &RemoteFunctionSet,
    code: PackageLocation,
    runtime: &str,
) -> ReconcilePlan {
    let function_name = remote_function_name(descriptor.name(), base_name);

    if snapshot.has(&function_name) {
        return ReconcilePlan::Update(UpdateFunctionCode {
            function_name,
            code,
        });
    }

    ReconcilePlan::Create(CreateFunction {
        function_name,
        runtime: runtime.to_string(),
        role: descriptor.role().to_string(),
        handler: base_name.to_string(),
        code,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::contract::DEFAULT_RUNTIME;
    use crate::naming::package_location;

    fn sample_descriptor() -> ProjectDescriptor {
        ProjectDescriptor::from_json(
            r#"{"Name":"svc","Bucket":"b","Role":"arn:aws:iam::1:role/x"}"#,
            ".",
            &HashMap::<String, String>::new(),
        )
        .expect("descriptor should load")
    }

    #[test]
    fn existing_function_is_updated() {
        let descriptor = sample_descriptor();
        let snapshot = RemoteFunctionSet::from_names(["svc_fetch"]);

        let plan = plan_reconcile(
            &descriptor,
            "fetch",
            &snapshot,
            package_location("b", "svc_fetch"),
            DEFAULT_RUNTIME,
        );

        assert_eq!(
            plan,
            ReconcilePlan::Update(UpdateFunctionCode {
                function_name: "svc_fetch".to_string(),
                code: PackageLocation {
                    bucket: "b".to_string(),
                    key: "svc_fetch.zip".to_string(),
                },
            })
        );
        assert_eq!(plan.action(), DeployAction::Update);
    }

    #[test]
    fn missing_function_is_created_with_role_runtime_and_handler() {
        let descriptor = sample_descriptor();

        let plan = plan_reconcile(
            &descriptor,
            "fetch",
            &RemoteFunctionSet::default(),
            package_location("b", "svc_fetch"),
            DEFAULT_RUNTIME,
        );

        let ReconcilePlan::Create(request) = plan else {
            panic!("expected a create plan");
        };
        assert_eq!(request.function_name, "svc_fetch");
        assert_eq!(request.handler, "fetch");
        assert_eq!(request.runtime, "go1.x");
        assert_eq!(request.role, "arn:aws:iam::1:role/x");
        assert_eq!(request.code.key, "svc_fetch.zip");
    }

    #[test]
    fn unprefixed_base_name_in_snapshot_does_not_count() {
        let descriptor = sample_descriptor();
        let snapshot = RemoteFunctionSet::from_names(["fetch"]);

        let plan = plan_reconcile(
            &descriptor,
            "fetch",
            &snapshot,
            package_location("b", "svc_fetch"),
            DEFAULT_RUNTIME,
        );
        assert_eq!(plan.action(), DeployAction::Create);
    }
}
