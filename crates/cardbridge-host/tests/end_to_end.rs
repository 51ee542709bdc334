//! End-to-end scenarios exercising the dispatcher against a simulated
//! PC/SC transport, matching the wire protocol's documented request/
//! response pairs exactly.

use cardbridge_host::dispatcher::dispatch;
use cardbridge_json::{parse, parse_request, to_string};
use cardbridge_pcsc::{Reconciler, Simulator};

fn dispatch_json(reconciler: &mut Reconciler<Simulator>, request_json: &str) -> String {
    let value = parse(request_json.as_bytes()).unwrap();
    let request = parse_request(&value).unwrap();
    let response = dispatch(reconciler, &request);
    to_string(&response)
}

#[test]
fn version_probe() {
    let mut r = Reconciler::new(Simulator::new());
    let out = dispatch_json(&mut r, r#"{"i":"q1","c":10}"#);
    assert_eq!(out, r#"{"i":"q1","verNat":"0.3.1"}"#);
}

#[test]
fn list_empty() {
    let mut r = Reconciler::new(Simulator::new());
    let out = dispatch_json(&mut r, r#"{"i":"q2","c":1}"#);
    assert_eq!(out, r#"{"i":"q2","d":[]}"#);
}

#[test]
fn connect_out_of_range() {
    let mut r = Reconciler::new(Simulator::new());
    let out = dispatch_json(&mut r, r#"{"i":"q3","c":2,"r":0}"#);
    assert_eq!(out, r#"{"i":"q3","incomplete":true}"#);
}

#[test]
fn card_insertion_event_shape() {
    let mut sim = Simulator::new();
    sim.plug_reader("Reader 1");
    sim.insert_card("Reader 1", vec![0x3B, 0x00]);
    let mut r = Reconciler::new(sim);
    r.list_phase().unwrap();

    let events = r.status_phase().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(to_string(&events[0]), r#"{"e":1,"r":0,"d":"3B00"}"#);
}

#[test]
fn transceive_chain_produces_thirty_six_hex_chars() {
    let mut sim = Simulator::new();
    sim.plug_reader("Reader 1");
    sim.insert_card("Reader 1", vec![0x3B, 0x00]);
    sim.script_response("Reader 1", vec![0x61, 0x10]);
    let mut final_response = vec![0xAAu8; 16];
    final_response.extend_from_slice(&[0x90, 0x00]);
    sim.script_response("Reader 1", final_response);

    let mut r = Reconciler::new(sim);
    r.list_phase().unwrap();
    dispatch_json(&mut r, r#"{"i":"q0","c":2,"r":0,"p":2}"#);

    let out = dispatch_json(
        &mut r,
        r#"{"i":"q4","c":4,"r":0,"a":"00A40400"}"#,
    );
    let expected_d = "AA".repeat(16) + "9000";
    assert_eq!(out, format!(r#"{{"i":"q4","d":"{expected_d}"}}"#));
    assert_eq!(expected_d.len(), 36);
}

#[test]
fn disconnect_on_closed_reader_is_i_only() {
    let mut sim = Simulator::new();
    sim.plug_reader("Reader 1");
    let mut r = Reconciler::new(sim);
    r.list_phase().unwrap();

    let out = dispatch_json(&mut r, r#"{"i":"q5","c":3,"r":0}"#);
    assert_eq!(out, r#"{"i":"q5"}"#);
}

#[test]
fn unknown_command_is_i_only() {
    let mut r = Reconciler::new(Simulator::new());
    let out = dispatch_json(&mut r, r#"{"i":"q6","c":999}"#);
    assert_eq!(out, r#"{"i":"q6"}"#);
}
