//! Host - Serve component factories to an orchestration host
//!
//! A [`ComponentProvider`] is built once at process start with its table of
//! component factories and then answers host requests until cancelled or
//! until stdin closes.
//!
//! # Example
//!
//! ```ignore
//! let provider = ProviderBuilder::new()
//!     .with_namespace("example-org")
//!     .with_component(ComponentF::<SecureBucket>::new())
//!     .build()?;
//!
//! provider.run("strata-components", "0.0.1").await?;
//! ```

pub mod component;
pub mod protocol;

use std::collections::BTreeMap;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::context::{Context, ContextError};
use crate::schema::ResourceSchema;

pub use component::{Component, ComponentF, ComponentFactory, ComponentSchema};
use protocol::{ConstructRequest, ConstructResult, RegisteredResource, Request, Response, ResponseBody};

/// Errors raised by the provider host
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Failed to build provider: {0}")]
    Build(String),

    #[error("Unknown component type: {0}")]
    UnknownComponent(String),

    #[error("Malformed request: {0}")]
    Protocol(String),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Name and version the provider is served under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
}

impl PackageInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Builder for [`ComponentProvider`]
#[derive(Default)]
pub struct ProviderBuilder {
    namespace: Option<String>,
    components: Vec<Box<dyn ComponentFactory>>,
    resource_schemas: Vec<ResourceSchema>,
}

impl ProviderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_component(mut self, factory: impl ComponentFactory + 'static) -> Self {
        self.components.push(Box::new(factory));
        self
    }

    /// Schemas that registrations made by the components are validated against
    pub fn with_resource_schemas(mut self, schemas: impl IntoIterator<Item = ResourceSchema>) -> Self {
        self.resource_schemas.extend(schemas);
        self
    }

    pub fn build(self) -> Result<ComponentProvider, HostError> {
        let namespace = self
            .namespace
            .filter(|ns| !ns.trim().is_empty())
            .ok_or_else(|| HostError::Build("namespace is required".to_string()))?;

        if self.components.is_empty() {
            return Err(HostError::Build("at least one component is required".to_string()));
        }

        let mut components = BTreeMap::new();
        for factory in self.components {
            let token = factory.type_token().to_string();
            validate_type_token(&token)?;
            if components.contains_key(&token) {
                return Err(HostError::Build(format!("duplicate component type '{}'", token)));
            }
            components.insert(token, factory);
        }

        Ok(ComponentProvider {
            namespace,
            components,
            resource_schemas: self.resource_schemas,
        })
    }
}

/// `<package>:<module>:<Type>`
fn validate_type_token(token: &str) -> Result<(), HostError> {
    let parts: Vec<&str> = token.split(':').collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        return Err(HostError::Build(format!(
            "invalid component type '{}': expected <package>:<module>:<Type>",
            token
        )));
    }
    Ok(())
}

/// Provider serving a fixed table of component factories
pub struct ComponentProvider {
    namespace: String,
    components: BTreeMap<String, Box<dyn ComponentFactory>>,
    resource_schemas: Vec<ResourceSchema>,
}

impl ComponentProvider {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn component_types(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    /// Package schema describing every component
    pub fn schema(&self, info: &PackageInfo) -> serde_json::Value {
        let resources: serde_json::Map<String, serde_json::Value> = self
            .components
            .iter()
            .map(|(token, factory)| (token.clone(), factory.schema().to_json()))
            .collect();

        serde_json::json!({
            "name": info.name,
            "version": info.version,
            "namespace": self.namespace,
            "resources": resources,
        })
    }

    /// Run a component factory and report everything it registered
    pub fn construct(&self, request: ConstructRequest) -> Result<ConstructResult, HostError> {
        let factory = self
            .components
            .get(&request.type_token)
            .ok_or_else(|| HostError::UnknownComponent(request.type_token.clone()))?;
        let options = request
            .options
            .into_options()
            .map_err(HostError::Protocol)?;

        let mut ctx = Context::with_schemas(self.resource_schemas.iter().cloned());
        let id = factory.construct(&mut ctx, &request.name, &request.inputs, &options)?;

        let outputs: BTreeMap<String, serde_json::Value> = ctx
            .outputs_of(&id)
            .map(|outputs| {
                outputs
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect()
            })
            .unwrap_or_default();
        let resources = ctx
            .ordered_resources()?
            .iter()
            .map(|r| RegisteredResource::new(r, ctx.graph()))
            .collect();

        Ok(ConstructResult {
            urn: id.to_string(),
            outputs,
            resources,
        })
    }

    /// Handle one request line. The flag is false once the loop should stop.
    pub fn handle_line(&self, line: &str, info: &PackageInfo) -> (Response, bool) {
        let request: Request = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                let err = HostError::Protocol(e.to_string());
                tracing::warn!(error = %err, "rejected request");
                return (Response::error(err.to_string()), true);
            }
        };

        match request {
            Request::GetSchema => {
                tracing::debug!("schema requested");
                let schema = self.schema(info);
                (Response::Result(ResponseBody::Schema { schema }), true)
            }
            Request::Construct(construct) => {
                let type_token = construct.type_token.clone();
                let name = construct.name.clone();
                tracing::info!(component = %type_token, name = %name, "construct");
                match self.construct(construct) {
                    Ok(result) => {
                        tracing::debug!(
                            component = %type_token,
                            name = %name,
                            resources = result.resources.len(),
                            "constructed"
                        );
                        (Response::Result(ResponseBody::Construct(result)), true)
                    }
                    Err(e) => {
                        tracing::warn!(component = %type_token, name = %name, error = %e, "construct failed");
                        (Response::error(e.to_string()), true)
                    }
                }
            }
            Request::Cancel => {
                tracing::info!("cancel requested");
                (Response::Result(ResponseBody::Cancelled { cancelled: true }), false)
            }
        }
    }

    /// Write the handshake, then answer requests line by line
    pub async fn serve<R, W>(&self, info: &PackageInfo, reader: R, mut writer: W) -> Result<(), HostError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let handshake = protocol::handshake(&info.name, &info.version);
        writer.write_all(handshake.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;

        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let (response, keep_serving) = self.handle_line(&line, info);
            let mut payload =
                serde_json::to_string(&response).map_err(|e| HostError::Protocol(e.to_string()))?;
            payload.push('\n');
            writer.write_all(payload.as_bytes()).await?;
            writer.flush().await?;

            if !keep_serving {
                break;
            }
        }

        tracing::info!(provider = %info.name, "serve loop finished");
        Ok(())
    }

    /// Serve over the process's stdin and stdout
    pub async fn run(&self, name: &str, version: &str) -> Result<(), HostError> {
        let info = PackageInfo::new(name, version);
        tracing::info!(
            provider = %info.name,
            version = %info.version,
            namespace = %self.namespace,
            "serving components"
        );
        self.serve(&info, BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde::Deserialize;

    use super::*;
    use crate::context::{ContextResult, ResourceOptions};
    use crate::output::Output;
    use crate::resource::{ResourceId, Value};
    use crate::schema::{AttributeSchema, AttributeType};

    #[derive(Deserialize)]
    struct PairArgs {
        label: Option<String>,
    }

    /// Component with one child that references nothing
    struct Pair {
        id: ResourceId,
    }

    impl Component for Pair {
        const TYPE: &'static str = "test:index:Pair";
        type Args = PairArgs;

        fn schema() -> ComponentSchema {
            ComponentSchema::new(
                ResourceSchema::new(Self::TYPE)
                    .attribute(AttributeSchema::new("label", AttributeType::String))
                    .strict(),
            )
            .output(AttributeSchema::new("childId", AttributeType::String))
        }

        fn construct(
            ctx: &mut Context,
            name: &str,
            args: PairArgs,
            options: &ResourceOptions,
        ) -> ContextResult<Self> {
            let id = ctx.register_component(Self::TYPE, name, options)?;
            let mut attrs = std::collections::HashMap::new();
            if let Some(label) = args.label {
                attrs.insert("label".to_string(), Value::String(label));
            }
            let child = ctx.register_resource(
                "test.child",
                &format!("{}-child", name),
                attrs,
                &options.for_child(&id),
            )?;
            ctx.register_outputs(
                &id,
                BTreeMap::from([("childId".to_string(), Output::pending(child, "id"))]),
            )?;
            Ok(Self { id })
        }

        fn id(&self) -> &ResourceId {
            &self.id
        }
    }

    fn provider() -> ComponentProvider {
        ProviderBuilder::new()
            .with_namespace("example-org")
            .with_component(ComponentF::<Pair>::new())
            .build()
            .unwrap()
    }

    fn info() -> PackageInfo {
        PackageInfo::new("test-components", "0.0.1")
    }

    #[test]
    fn build_requires_namespace() {
        let err = ProviderBuilder::new()
            .with_component(ComponentF::<Pair>::new())
            .build()
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "Failed to build provider: namespace is required");
    }

    #[test]
    fn build_requires_components() {
        let err = ProviderBuilder::new()
            .with_namespace("example-org")
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, HostError::Build(_)));
    }

    #[test]
    fn build_rejects_duplicate_components() {
        let err = ProviderBuilder::new()
            .with_namespace("example-org")
            .with_component(ComponentF::<Pair>::new())
            .with_component(ComponentF::<Pair>::new())
            .build()
            .err()
            .unwrap();
        assert!(err.to_string().contains("duplicate component type 'test:index:Pair'"));
    }

    #[test]
    fn type_tokens_need_three_parts() {
        assert!(validate_type_token("custom:module:SecureBucket").is_ok());
        assert!(validate_type_token("custom:SecureBucket").is_err());
        assert!(validate_type_token("custom::SecureBucket").is_err());
    }

    #[test]
    fn schema_lists_components() {
        let provider = provider();
        let schema = provider.schema(&info());
        assert_eq!(schema["namespace"], "example-org");
        assert_eq!(schema["name"], "test-components");
        assert_eq!(schema["resources"]["test:index:Pair"]["isComponent"], true);
        assert_eq!(provider.component_types().collect::<Vec<_>>(), vec!["test:index:Pair"]);
    }

    #[test]
    fn construct_reports_registrations_and_outputs() {
        let provider = provider();
        let line = r#"{"method":"construct","type":"test:index:Pair","name":"p","inputs":{"label":"x"},"options":{"provider":"mem"}}"#;
        let (response, keep) = provider.handle_line(line, &info());
        assert!(keep);

        let json = serde_json::to_value(&response).unwrap();
        let result = &json["result"];
        assert_eq!(result["urn"], "test:index:Pair::p");
        assert_eq!(
            result["outputs"]["childId"],
            serde_json::json!({ "$unknown": { "resource": "test.child::p-child", "attribute": "id" } })
        );
        let resources = result["resources"].as_array().unwrap();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[1]["parent"], "test:index:Pair::p");
        assert_eq!(resources[1]["provider"], "mem");
        assert_eq!(resources[1]["inputs"]["label"], "x");
    }

    #[test]
    fn errors_are_reported_unmodified() {
        let provider = provider();
        let line = r#"{"method":"construct","type":"test:index:Pair","name":""}"#;
        let (response, keep) = provider.handle_line(line, &info());
        assert!(keep);
        assert_eq!(
            response,
            Response::error("Invalid resource name '': name must not be empty")
        );

        let (response, _) = provider.handle_line(
            r#"{"method":"construct","type":"test:index:Missing","name":"m"}"#,
            &info(),
        );
        assert_eq!(response, Response::error("Unknown component type: test:index:Missing"));
    }

    #[test]
    fn malformed_line_keeps_serving() {
        let provider = provider();
        let (response, keep) = provider.handle_line("{not json", &info());
        assert!(keep);
        assert!(matches!(response, Response::Error(_)));
    }

    #[tokio::test]
    async fn serve_answers_until_cancel() {
        let provider = provider();
        let input = concat!(
            r#"{"method":"getSchema"}"#,
            "\n\n",
            r#"{"method":"cancel"}"#,
            "\n",
            r#"{"method":"getSchema"}"#,
            "\n"
        );
        let mut out = Vec::new();
        provider
            .serve(&info(), input.as_bytes(), &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "STRATA_PROVIDER|1|test-components|0.0.1");
        let schema: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(schema["result"]["schema"]["namespace"], "example-org");
        assert_eq!(lines[2], r#"{"result":{"cancelled":true}}"#);
    }

    #[tokio::test]
    async fn serve_stops_at_end_of_input() {
        let provider = provider();
        let mut out = Vec::new();
        provider.serve(&info(), &b""[..], &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "STRATA_PROVIDER|1|test-components|0.0.1\n");
    }
}
