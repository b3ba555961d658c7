//! Reference testbed scenarios.
//!
//! Each test drives a fresh testbed pipeline with frames built by simulated
//! hosts and checks both the emitted reply and the store.

use std::net::Ipv4Addr;

use mailbox_core::{
    AdminCommand, DropReason, Pipeline, PipelineAction, ProofMix, RouteConfig, ServiceEndpoint,
    SlotState,
};
use mailbox_harness::{
    Reply, SimHost,
    fixtures::{WRONG_PASSWORD, emitted, host_ip, testbed_config, testbed_hosts, testbed_pipeline},
};
use mailbox_proto::Opcode;

fn pipeline() -> Pipeline {
    testbed_pipeline().unwrap()
}

/// Process `frame` and decode the reply, asserting it leaves on `port`.
fn exchange(pipeline: &Pipeline, frame: bytes::Bytes, port: u16) -> Reply {
    let (egress, reply) = emitted(pipeline.process(frame)).expect("reply emitted");
    assert_eq!(egress, port, "reply left on the wrong port");
    Reply::parse(&reply).unwrap()
}

fn dropped(pipeline: &Pipeline, frame: bytes::Bytes) -> DropReason {
    match pipeline.process(frame) {
        PipelineAction::Drop { reason } => reason,
        PipelineAction::Emit { port, .. } => panic!("expected drop, emitted on port {port}"),
    }
}

#[test]
fn scenario_a_drop_off_is_acknowledged() {
    let pipeline = pipeline();
    let [h1, _, _] = testbed_hosts();

    let reply = exchange(&pipeline, h1.drop_off(2, 0xDEAD_BEEF, 0x6530_a3c0), 1);

    assert_eq!(reply.opcode(), Some(Opcode::Ack));
    assert_eq!(reply.header.mailbox_num(), 2);
    assert_eq!(reply.message(), 0xDEAD_BEEF);
    assert_eq!(reply.header.host_id(), 1);
    assert_eq!(reply.header.salt(), 0x6530_a3c0);
    assert_eq!(reply.header.password_proof(), 0x71bf_c5d5);
    assert_eq!(pipeline.store().read(2).unwrap(), SlotState::occupied(0xDEAD_BEEF));
}

#[test]
fn scenario_a_reply_addressing_is_swapped() {
    let pipeline = pipeline();
    let [h1, _, _] = testbed_hosts();

    let reply = exchange(&pipeline, h1.drop_off(2, 0xDEAD_BEEF, 1), 1);

    assert_eq!(reply.src_ip, ServiceEndpoint::DEFAULT_IP);
    assert_eq!(reply.dst_ip, host_ip(1));
    assert_eq!(reply.src_mac, SimHost::GATEWAY_MAC);
    assert_eq!(reply.dst_mac, SimHost::MAC);
    assert_eq!((reply.src_port, reply.dst_port), (0xFFFF, 0xFFFF));
}

#[test]
fn scenario_b_another_host_picks_up() {
    let pipeline = pipeline();
    let [h1, h2, _] = testbed_hosts();

    exchange(&pipeline, h1.drop_off(2, 0xDEAD_BEEF, 11), 1);
    let reply = exchange(&pipeline, h2.pick_up(2, 22), 2);

    assert_eq!(reply.opcode(), Some(Opcode::Ack));
    assert_eq!(reply.message(), 0xDEAD_BEEF);
    assert_eq!(reply.header.host_id(), 2);
    assert_eq!(reply.dst_ip, host_ip(2));
}

#[test]
fn scenario_c_admin_clear_between_drop_and_pick() {
    let pipeline = pipeline();
    let [h1, h2, _] = testbed_hosts();

    exchange(&pipeline, h1.drop_off(2, 0xDEAD_BEEF, 11), 1);
    AdminCommand::Clear { mailbox: 2 }.apply(pipeline.store()).unwrap();
    let reply = exchange(&pipeline, h2.pick_up(2, 22), 2);

    assert_eq!(reply.opcode(), Some(Opcode::Empty));
    assert_eq!(reply.message(), 0);
}

#[test]
fn scenario_d_wrong_password_leaves_slot_untouched() {
    let pipeline = pipeline();
    let [h1, _, h3] = testbed_hosts();

    exchange(&pipeline, h3.drop_off(4, 0x1111_1111, 5), 3);
    let impostor = h1.with_password(WRONG_PASSWORD);
    let reply = exchange(&pipeline, impostor.drop_off(4, 0x2222_2222, 6), 1);

    assert_eq!(reply.opcode(), Some(Opcode::AuthFail));
    assert_eq!(reply.message(), 0x2222_2222);
    assert_eq!(reply.header.mailbox_num(), 4);
    assert_eq!(pipeline.store().read(4).unwrap(), SlotState::occupied(0x1111_1111));
}

#[test]
fn wrong_password_pick_up_reveals_nothing() {
    let pipeline = pipeline();
    let [h1, h2, _] = testbed_hosts();

    exchange(&pipeline, h1.drop_off(8, 0xCAFE_F00D, 1), 1);
    let header = h2.clone().with_password(WRONG_PASSWORD).request(2, 8, 0x0BAD_0BAD, 2);
    let reply = exchange(&pipeline, h2.frame(&header), 2);

    assert_eq!(reply.opcode(), Some(Opcode::AuthFail));
    assert_eq!(reply.message(), 0x0BAD_0BAD);
}

#[test]
fn unknown_host_is_treated_as_unauthenticated() {
    let pipeline = pipeline();
    let stranger = SimHost::new(42, host_ip(1), 0x1234_5678);

    let reply = exchange(&pipeline, stranger.drop_off(0, 7, 3), 1);

    assert_eq!(reply.opcode(), Some(Opcode::AuthFail));
    assert_eq!(reply.message(), 7);
    assert_eq!(pipeline.store().read(0).unwrap(), SlotState::EMPTY);
}

#[test]
fn fresh_mailboxes_are_empty() {
    let pipeline = pipeline();
    let [h1, _, _] = testbed_hosts();

    for mailbox in [0, 1, 2, 4, 8, 31] {
        let reply = exchange(&pipeline, h1.pick_up(mailbox, u32::from(mailbox)), 1);
        assert_eq!(reply.opcode(), Some(Opcode::Empty), "mailbox {mailbox}");
        assert_eq!(reply.message(), 0);
    }
}

#[test]
fn pick_up_does_not_consume() {
    let pipeline = pipeline();
    let [h1, h2, h3] = testbed_hosts();

    exchange(&pipeline, h1.drop_off(1, 99, 1), 1);
    for (host, port) in [(&h2, 2), (&h3, 3), (&h2, 2)] {
        let reply = exchange(&pipeline, host.pick_up(1, 7), port);
        assert_eq!((reply.opcode(), reply.message()), (Some(Opcode::Ack), 99));
    }
}

#[test]
fn drop_off_overwrites() {
    let pipeline = pipeline();
    let [h1, h2, _] = testbed_hosts();

    exchange(&pipeline, h1.drop_off(3, 1, 1), 1);
    exchange(&pipeline, h2.drop_off(3, 2, 2), 2);

    assert_eq!(exchange(&pipeline, h1.pick_up(3, 3), 1).message(), 2);
}

#[test]
fn out_of_range_mailbox_is_dropped() {
    let pipeline = pipeline();
    let [h1, _, _] = testbed_hosts();

    assert_eq!(
        dropped(&pipeline, h1.drop_off(32, 1, 1)),
        DropReason::OutOfRange { mailbox: 32, capacity: 32 }
    );
    assert_eq!(
        dropped(&pipeline, h1.pick_up(u16::MAX, 1)),
        DropReason::OutOfRange { mailbox: u16::MAX, capacity: 32 }
    );
}

#[test]
fn unsupported_opcodes_are_dropped() {
    let pipeline = pipeline();
    let [h1, _, _] = testbed_hosts();

    for opcode in [0x0000, 0x0003, 0x2333, 0xFFFF] {
        let frame = h1.frame(&h1.request(opcode, 1, 1, 1));
        assert_eq!(dropped(&pipeline, frame), DropReason::UnsupportedOpcode(opcode));
    }
    assert!(pipeline.store().snapshot().iter().all(|slot| !slot.occupied));
}

#[test]
fn wrong_service_ip_is_ordinary_traffic() {
    let pipeline = pipeline();
    let [h1, _, _] = testbed_hosts();
    let elsewhere = ServiceEndpoint { ip: Ipv4Addr::new(10, 0, 0, 253), ..Default::default() };

    let frame = h1.clone().with_service(elsewhere).drop_off(2, 1, 1);

    assert_eq!(
        dropped(&pipeline, frame),
        DropReason::UnroutableDestination(Ipv4Addr::new(10, 0, 0, 253))
    );
    assert_eq!(pipeline.store().read(2).unwrap(), SlotState::EMPTY);
}

#[test]
fn smp_shaped_traffic_to_a_host_is_forwarded_verbatim() {
    let pipeline = pipeline();
    let [h1, _, _] = testbed_hosts();
    let to_h3 = ServiceEndpoint { ip: host_ip(3), ..Default::default() };

    let frame = h1.clone().with_service(to_h3).drop_off(2, 1, 1);

    assert_eq!(emitted(pipeline.process(frame.clone())), Some((3, frame)));
    assert_eq!(pipeline.store().read(2).unwrap(), SlotState::EMPTY);
}

#[test]
fn wrong_ports_are_ordinary_traffic() {
    let pipeline = pipeline();
    let [h1, _, _] = testbed_hosts();

    for (src_port, dst_port) in [(0xFFFE, 0xFFFF), (0xFFFF, 0xFFFE), (1234, 5678)] {
        let service = ServiceEndpoint { src_port, dst_port, ..Default::default() };
        let frame = h1.clone().with_service(service).drop_off(2, 1, 1);

        assert_eq!(
            dropped(&pipeline, frame),
            DropReason::UnroutableDestination(ServiceEndpoint::DEFAULT_IP)
        );
    }
    assert_eq!(pipeline.store().read(2).unwrap(), SlotState::EMPTY);
}

#[test]
fn ordinary_traffic_to_service_ip_follows_forwarding() {
    let mut config = testbed_config();
    config.routes.push(RouteConfig { dst: ServiceEndpoint::DEFAULT_IP, port: 3 });
    let pipeline = config.build_pipeline().unwrap();
    let [h1, _, _] = testbed_hosts();

    let tcp = h1.builder_to(ServiceEndpoint::DEFAULT_IP).tcp(0xFFFF, 0xFFFF, &[0; 20]);
    let udp = h1.builder_to(ServiceEndpoint::DEFAULT_IP).udp(53, 53, b"query");
    let short = h1.builder_to(ServiceEndpoint::DEFAULT_IP).udp(0xFFFF, 0xFFFF, &[1; 19]);

    for frame in [tcp, udp, short] {
        assert_eq!(emitted(pipeline.process(frame.clone())), Some((3, frame)));
    }
    assert!(pipeline.store().snapshot().iter().all(|slot| !slot.occupied));
}

#[test]
fn ordinary_traffic_between_hosts() {
    let pipeline = pipeline();
    let [h1, h2, _] = testbed_hosts();

    let frame = h1.builder_to(h2.ip()).udp(4000, 4001, b"hello h2");

    assert_eq!(emitted(pipeline.process(frame.clone())), Some((2, frame)));
}

#[test]
fn malformed_frames_are_dropped() {
    let pipeline = pipeline();

    let reason = dropped(&pipeline, bytes::Bytes::from_static(&[0u8; 10]));

    assert!(matches!(reason, DropReason::MalformedPacket(_)));
}

#[test]
fn unroutable_reply_still_updates_store() {
    let pipeline = pipeline();
    let roaming = SimHost::new(1, Ipv4Addr::new(10, 0, 0, 9), testbed_hosts()[0].stored_hash());

    let reason = dropped(&pipeline, roaming.drop_off(5, 55, 1));

    assert_eq!(reason, DropReason::UnroutableDestination(Ipv4Addr::new(10, 0, 0, 9)));
    assert_eq!(pipeline.store().read(5).unwrap(), SlotState::occupied(55));
}

#[test]
fn and_mix_interoperates_with_reference_hosts() {
    let config = mailbox_core::SwitchConfig { proof_mix: ProofMix::And, ..testbed_config() };
    let pipeline = config.build_pipeline().unwrap();
    let [h1, h2, _] = testbed_hosts();

    let reply = exchange(&pipeline, h1.clone().with_mix(ProofMix::And).drop_off(0, 77, 9), 1);
    assert_eq!(reply.opcode(), Some(Opcode::Ack));

    let reply = exchange(&pipeline, h2.pick_up(0, 9), 2);
    assert_eq!(reply.opcode(), Some(Opcode::AuthFail));
}
