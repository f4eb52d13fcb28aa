use crate::{
    grpc::{TranslatorConfig, TranslatorMetrics},
    k8s, Destination,
};
use anyhow::Result;
use clap::Parser;
use prometheus_client::registry::Registry;
use tracing::info;

#[derive(Debug, Parser)]
#[clap(name = "destination", about = "Translates service endpoints for Linkerd proxies")]
pub struct Args {
    #[clap(
        long,
        default_value = "linkerd=info,warn",
        env = "LINKERD_DESTINATION_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    #[clap(flatten)]
    translator: TranslatorArgs,
}

#[derive(Clone, Debug, clap::Args)]
pub struct TranslatorArgs {
    #[clap(long, default_value = "linkerd")]
    controller_namespace: String,

    /// Workload identities are only sent to clients when a trust domain is set.
    #[clap(long, default_value = "")]
    identity_trust_domain: String,

    #[clap(long, default_value = "true", action = clap::ArgAction::Set)]
    enable_h2_upgrade: bool,
}

// === impl Args ===

impl Args {
    /// Initializes logging and the Kubernetes client, registering translator metrics with
    /// `prom`.
    pub async fn init(self, prom: &mut Registry) -> Result<Destination<k8s::Nodes>> {
        let Self {
            log_level,
            log_format,
            client,
            translator,
        } = self;

        log_format.try_init(log_level)?;

        let config = translator.into_config();
        info!(?config, "Initializing endpoint translation");

        let client = client.try_client().await?;
        let metrics =
            TranslatorMetrics::register(prom.sub_registry_with_prefix("endpoint_translator"));
        Ok(Destination::new(config, k8s::Nodes::new(client), metrics))
    }
}

// === impl TranslatorArgs ===

impl TranslatorArgs {
    pub fn into_config(self) -> TranslatorConfig {
        let Self {
            controller_namespace,
            identity_trust_domain,
            enable_h2_upgrade,
        } = self;

        TranslatorConfig {
            controller_ns: controller_namespace,
            identity_trust_domain: Some(identity_trust_domain).filter(|td| !td.is_empty()),
            enable_h2_upgrade,
        }
    }
}
