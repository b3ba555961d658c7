//! Fuzz the whole data path with arbitrary frames.
//!
//! No input may panic. Anything the pipeline emits must either be the input
//! frame (ordinary forwarding) or a same-length reply whose addresses are
//! the request's, swapped.

#![no_main]

use std::sync::{Arc, OnceLock};

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use mailbox_core::{
    HostConfig, Pipeline, PipelineAction, RouteConfig, ServiceEndpoint, SwitchConfig,
};
use mailbox_proto::Ipv4Packet;

fn pipeline() -> &'static Arc<Pipeline> {
    static PIPELINE: OnceLock<Arc<Pipeline>> = OnceLock::new();
    PIPELINE.get_or_init(|| {
        let config = SwitchConfig {
            mailbox_slots: 8,
            hosts: vec![HostConfig {
                id: 1,
                ip: [10, 0, 0, 1].into(),
                port: 1,
                password_hash: Some(2_195_217_097),
                password: None,
            }],
            routes: vec![RouteConfig { dst: ServiceEndpoint::DEFAULT_IP, port: 2 }],
            ..SwitchConfig::default()
        };
        Arc::new(config.build_pipeline().expect("fuzz config is valid"))
    })
}

fuzz_target!(|data: &[u8]| {
    let frame = Bytes::copy_from_slice(data);

    let PipelineAction::Emit { frame: out, .. } = pipeline().process(frame.clone()) else {
        return;
    };
    if out == frame {
        return;
    }

    assert_eq!(out.len(), frame.len());
    let request = Ipv4Packet::parse(&frame).expect("replied to an unparseable frame");
    let reply = Ipv4Packet::parse(&out).expect("reply parses");
    assert_eq!(reply.ip().src(), request.ip().dst());
    assert_eq!(reply.ip().dst(), request.ip().src());
    assert_eq!(reply.ethernet().src(), request.ethernet().dst());
    assert_eq!(reply.ethernet().dst(), request.ethernet().src());
});
