//! Integration tests for the panel link
//!
//! These tests verify end-to-end behavior of the link including:
//! - Export datagrams over UDP reaching the actor and becoming field events
//! - Key events becoming command datagrams at the simulator end
//! - Cycle controls continuing from the cockpit's live position
//! - Decoding being independent of how the stream is split into datagrams

use std::time::Duration;

use bios_input::{InputKey, LcdButton, Transition};
use bios_link::{
    run_link_actor, BiosValue, CommandSender, ExportListener, LinkCommand, LinkEvent, PanelLink,
    Profile,
};
use bios_protocol::{ExportFrame, FieldSpec, FieldUpdate, FieldValue};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    /// A-10C style profile with one field of each kind
    pub fn warthog_profile() -> Profile {
        let mut profile = Profile::default();
        profile.fields.insert(
            "AAP_STEER".into(),
            FieldSpec::Integer {
                address: 0x10E8,
                mask: 0x0C00,
                shift_by: 10,
            },
        );
        profile.fields.insert(
            "CDU_LINE_0".into(),
            FieldSpec::String {
                address: 0x11C0,
                max_length: 8,
            },
        );
        profile.keys.insert("G1_M1".into(), "AAP_STEER CYCLE 1 2".into());
        profile.keys.insert("G2_M1".into(), "AAP_CDUPWR CUSTOM AAP_CDUPWR 1|AAP_CDUPWR 0|".into());
        profile.keys.insert("OK".into(), "CDU_LSK_3L PUSH_BUTTON".into());
        profile
    }

    /// Frame carrying a steer position and a CDU line
    pub fn warthog_frame(steer: u16, cdu: &str) -> Vec<u8> {
        let mut frame = ExportFrame::new();
        frame.word(0x10E8, steer << 10).text(0x11C0, 8, cdu);
        frame.finish()
    }

    /// Receive events until one matches, with a timeout
    pub async fn wait_for<F>(rx: &mut mpsc::Receiver<LinkEvent>, mut pred: F) -> LinkEvent
    where
        F: FnMut(&LinkEvent) -> bool,
    {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let event = rx.recv().await.expect("event channel closed");
                if pred(&event) {
                    return event;
                }
            }
        })
        .await
        .expect("timed out waiting for event")
    }

    /// Field updates in an event list
    pub fn field_updates(events: &[LinkEvent]) -> Vec<FieldUpdate> {
        events
            .iter()
            .filter_map(|e| match e {
                LinkEvent::FieldChanged(update) => Some(update.clone()),
                _ => None,
            })
            .collect()
    }
}

use helpers::*;

// ============================================================================
// Engine Tests
// ============================================================================

mod engine_tests {
    use super::*;

    #[test]
    fn test_cycle_follows_cockpit_position() {
        let mut link = PanelLink::with_profile(&warthog_profile()).unwrap();
        let g1 = InputKey::GKey { key: 1, mode: 1 };

        link.process_export(&warthog_frame(2, ""));
        assert_eq!(link.panel().int_value("AAP_STEER"), 2);

        let sent: Vec<Vec<u8>> = (0..3)
            .flat_map(|_| link.button(g1, Transition::Pressed))
            .collect();
        assert_eq!(
            sent,
            vec![
                b"AAP_STEER 1\n".to_vec(),
                b"AAP_STEER 0\n".to_vec(),
                b"AAP_STEER 1\n".to_vec(),
            ]
        );
    }

    #[test]
    fn test_custom_and_lcd_push_button() {
        let mut link = PanelLink::with_profile(&warthog_profile()).unwrap();

        assert_eq!(
            link.button(InputKey::GKey { key: 2, mode: 1 }, Transition::Pressed),
            vec![b"AAP_CDUPWR 1\n".to_vec(), b"AAP_CDUPWR 0\n".to_vec()]
        );
        assert_eq!(
            link.button(InputKey::LcdButton(LcdButton::Ok), Transition::Pressed),
            vec![b"CDU_LSK_3L 1\n".to_vec(), b"CDU_LSK_3L 0\n".to_vec()]
        );
        assert!(link
            .button(InputKey::LcdButton(LcdButton::Ok), Transition::Released)
            .is_empty());
    }

    #[test]
    fn test_string_changes_only_reported_when_changed() {
        let mut link = PanelLink::with_profile(&warthog_profile()).unwrap();

        let first = link.process_export(&warthog_frame(0, "WP 1"));
        let second = link.process_export(&warthog_frame(0, "WP 1"));
        let third = link.process_export(&warthog_frame(0, "WP 2"));

        assert_eq!(field_updates(&first).len(), 2);
        assert!(field_updates(&second).is_empty());
        assert_eq!(
            field_updates(&third),
            vec![FieldUpdate {
                name: "CDU_LINE_0".into(),
                value: FieldValue::Text("WP 2".into()),
            }]
        );
    }

    #[test]
    fn test_garbage_before_first_sync_is_ignored() {
        let mut link = PanelLink::with_profile(&warthog_profile()).unwrap();

        let mut stream = vec![0x12, 0xE8, 0x10, 0x02, 0x00, 0x00, 0x08];
        stream.extend(warthog_frame(1, "OK"));
        let events = link.process_export(&stream);

        assert_eq!(events.iter().filter(|e| **e == LinkEvent::FrameSync).count(), 1);
        assert_eq!(link.panel().int_value("AAP_STEER"), 1);
    }
}

// ============================================================================
// Network Tests
// ============================================================================

mod network_tests {
    use super::*;

    #[tokio::test]
    async fn test_udp_round_trip() {
        // Simulator side: export source and command sink
        let sim_export = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let sim_commands = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let listener = ExportListener::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap()
            .with_recv_timeout(Duration::from_millis(50));
        let listen_addr = listener.local_addr().unwrap();
        let sender = CommandSender::new(sim_commands.local_addr().unwrap())
            .await
            .unwrap();

        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let (event_tx, mut event_rx) = mpsc::channel(64);
        let (out_tx, out_rx) = mpsc::channel(64);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let actor = tokio::spawn(run_link_actor(cmd_rx, event_tx, out_tx));
        let listen = tokio::spawn(listener.run(cmd_tx.clone(), shutdown_rx));
        let send = tokio::spawn(sender.run(out_rx));

        cmd_tx
            .send(LinkCommand::LoadProfile(warthog_profile()))
            .await
            .unwrap();
        wait_for(&mut event_rx, |e| matches!(e, LinkEvent::ProfileLoaded { .. })).await;

        sim_export
            .send_to(&warthog_frame(1, "STEER"), listen_addr)
            .await
            .unwrap();
        let event = wait_for(&mut event_rx, |e| {
            matches!(e, LinkEvent::FieldChanged(u) if u.name == "CDU_LINE_0")
        })
        .await;
        assert_eq!(
            event,
            LinkEvent::FieldChanged(FieldUpdate {
                name: "CDU_LINE_0".into(),
                value: FieldValue::Text("STEER".into()),
            })
        );

        cmd_tx
            .send(LinkCommand::Button {
                key: InputKey::GKey { key: 1, mode: 1 },
                transition: Transition::Pressed,
            })
            .await
            .unwrap();

        let mut buf = [0u8; 64];
        let n = tokio::time::timeout(Duration::from_secs(2), sim_commands.recv(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf[..n], b"AAP_STEER 2\n");

        let (resp_tx, resp_rx) = tokio::sync::oneshot::channel();
        cmd_tx
            .send(LinkCommand::QueryValue {
                name: "AAP_STEER".into(),
                response: resp_tx,
            })
            .await
            .unwrap();
        assert_eq!(resp_rx.await.unwrap(), Some(BiosValue::Integer(1)));

        shutdown_tx.send(true).unwrap();
        assert!(listen.await.unwrap().is_ok());

        cmd_tx.send(LinkCommand::Shutdown).await.unwrap();
        actor.await.unwrap();
        assert!(send.await.unwrap().is_ok());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    fn cdu_text() -> impl Strategy<Value = String> {
        // No 'U' so text never forms a sync run
        "[ -TV-Z0-9]{0,8}"
    }

    proptest! {
        #[test]
        fn datagram_boundaries_do_not_matter(
            frames in prop::collection::vec((0u16..3, cdu_text()), 1..6),
            cuts in prop::collection::vec(1usize..32, 1..20),
        ) {
            let stream: Vec<u8> = frames
                .iter()
                .flat_map(|(steer, text)| warthog_frame(*steer, text))
                .collect();

            let mut whole = PanelLink::with_profile(&warthog_profile()).unwrap();
            let whole_events = whole.process_export(&stream);

            let mut split = PanelLink::with_profile(&warthog_profile()).unwrap();
            let mut split_events = Vec::new();
            let mut rest = stream.as_slice();
            for cut in cuts.iter().cycle() {
                if rest.is_empty() {
                    break;
                }
                let (head, tail) = rest.split_at((*cut).min(rest.len()));
                split_events.extend(split.process_export(head));
                rest = tail;
            }

            prop_assert_eq!(whole_events, split_events);
            prop_assert_eq!(whole.parser_state(), split.parser_state());
        }

        #[test]
        fn last_frame_wins(frames in prop::collection::vec((0u16..3, cdu_text()), 1..6)) {
            let mut link = PanelLink::with_profile(&warthog_profile()).unwrap();
            for (steer, text) in &frames {
                link.process_export(&warthog_frame(*steer, text));
            }

            let (steer, _) = frames.last().unwrap();
            prop_assert_eq!(link.panel().int_value("AAP_STEER"), i64::from(*steer));

            // An all-empty history never marks the string field dirty
            if frames.iter().any(|(_, t)| !t.is_empty()) {
                let (_, text) = frames.last().unwrap();
                prop_assert_eq!(
                    link.panel().get("CDU_LINE_0").map(|v| v.to_string()),
                    Some(text.clone())
                );
            }
        }
    }
}
