#![allow(dead_code)]

use hybrid_agent::{
    route, AgentConfig, AgentMetrics, Dispatcher, HandlerContext, ReverseAgent,
};
use hybrid_core::{PlmMetadataService, PlmService};
use hybrid_proto::Request;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::hub::MockHub;

pub fn test_config() -> AgentConfig {
    AgentConfig {
        hub_uri: "http://127.0.0.1:50051".to_string(),
        on_exception_delay: Duration::from_secs(2),
        ..AgentConfig::default()
    }
}

pub fn test_agent<P>(hub: Arc<MockHub>, plm: Arc<P>, config: &AgentConfig) -> ReverseAgent<MockHub>
where
    P: PlmService + PlmMetadataService + 'static,
{
    ReverseAgent::new(hub, plm.clone(), plm, config)
}

pub fn test_dispatcher<P>(hub: Arc<MockHub>, plm: Arc<P>) -> (Dispatcher<MockHub>, Arc<AgentMetrics>)
where
    P: PlmService + PlmMetadataService + 'static,
{
    let metrics = Arc::new(AgentMetrics::new());
    let ctx = HandlerContext::new(plm.clone(), plm, hub);
    (Dispatcher::new(ctx, Arc::clone(&metrics)), metrics)
}

/// Route `request` and run its handler to completion.
pub async fn dispatch(dispatcher: &Dispatcher<MockHub>, request: Request) {
    let unit = route(request).expect("request should route");
    dispatcher.publish(unit, &CancellationToken::new()).await;
}
