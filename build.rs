//! Build script generating the provider gRPC service.
//!
//! The protocol messages are declared by hand in `src/protocol.rs`, so the
//! service stubs are generated from a Rust description and no `protoc` is
//! needed at build time. The output lands in `OUT_DIR` as
//! `hemmer.provider.v1.Provider.rs` and is included by `src/protocol.rs`.

use tonic_prost_build::manual::{Builder, Method, Service};

const CODEC: &str = "tonic_prost::ProstCodec";

/// (rust name, route name, request type, response type)
const METHODS: &[(&str, &str, &str, &str)] = &[
    ("get_metadata", "GetMetadata", "GetMetadataRequest", "GetMetadataResponse"),
    ("get_schema", "GetSchema", "GetSchemaRequest", "GetSchemaResponse"),
    (
        "validate_provider_config",
        "ValidateProviderConfig",
        "ValidateProviderConfigRequest",
        "ValidateProviderConfigResponse",
    ),
    ("configure", "Configure", "ConfigureRequest", "ConfigureResponse"),
    ("stop", "Stop", "StopRequest", "StopResponse"),
    (
        "validate_resource_config",
        "ValidateResourceConfig",
        "ValidateResourceConfigRequest",
        "ValidateResourceConfigResponse",
    ),
    (
        "upgrade_resource_state",
        "UpgradeResourceState",
        "UpgradeResourceStateRequest",
        "UpgradeResourceStateResponse",
    ),
    ("plan", "Plan", "PlanRequest", "PlanResponse"),
    ("create", "Create", "CreateRequest", "CreateResponse"),
    ("read", "Read", "ReadRequest", "ReadResponse"),
    ("update", "Update", "UpdateRequest", "UpdateResponse"),
    ("delete", "Delete", "DeleteRequest", "DeleteResponse"),
    (
        "import_resource_state",
        "ImportResourceState",
        "ImportResourceStateRequest",
        "ImportResourceStateResponse",
    ),
    (
        "validate_data_source_config",
        "ValidateDataSourceConfig",
        "ValidateDataSourceConfigRequest",
        "ValidateDataSourceConfigResponse",
    ),
    (
        "read_data_source",
        "ReadDataSource",
        "ReadDataSourceRequest",
        "ReadDataSourceResponse",
    ),
];

fn main() {
    let service = METHODS
        .iter()
        .fold(
            Service::builder().name("Provider").package("hemmer.provider.v1"),
            |service, (name, route, input, output)| {
                service.method(
                    Method::builder()
                        .name(*name)
                        .route_name(*route)
                        .input_type(format!("crate::protocol::{}", input))
                        .output_type(format!("crate::protocol::{}", output))
                        .codec_path(CODEC)
                        .build(),
                )
            },
        )
        .build();

    Builder::new().build_client(false).compile(&[service]);

    println!("cargo:rerun-if-changed=build.rs");
}
