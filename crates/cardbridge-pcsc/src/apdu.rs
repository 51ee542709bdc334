//! Chained APDU transmission honoring the ISO 7816 `61 xx` "more
//! data available" continuation pattern.

use crate::error::PcscError;
use crate::transport::PcscTransport;
use crate::types::ConnHandle;
use cardbridge_core::constants::{GET_RESPONSE_HEADER, SW1_MORE_DATA};
use cardbridge_core::{encode_hex, Error, Protocol, Result};

/// Transmit `apdu`, following every `61 xx` response with a `GET
/// RESPONSE` until the card returns a terminal status word.
/// Concatenates intermediate response bodies (SW1/SW2 stripped) with
/// the final response (SW1/SW2 included) into one hex string.
pub fn chained_transmit<T: PcscTransport>(
    transport: &mut T,
    handle: ConnHandle,
    protocol: Protocol,
    apdu: &[u8],
) -> Result<String> {
    let mut hex = String::new();
    let mut response = transmit_one(transport, handle, protocol, apdu)?;

    while response.len() >= 2 && response[response.len() - 2] == SW1_MORE_DATA {
        hex.push_str(&encode_hex(&response[..response.len() - 2]));
        let sw2 = response[response.len() - 1];
        let mut get_response = GET_RESPONSE_HEADER.to_vec();
        get_response.push(sw2);
        response = transmit_one(transport, handle, protocol, &get_response)?;
    }

    hex.push_str(&encode_hex(&response));
    Ok(hex)
}

fn transmit_one<T: PcscTransport>(
    transport: &mut T,
    handle: ConnHandle,
    protocol: Protocol,
    apdu: &[u8],
) -> Result<Vec<u8>> {
    transport
        .transmit(handle, protocol, apdu)
        .map_err(|e: PcscError| Error::from(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::Simulator;
    use cardbridge_core::ShareMode;

    fn connected(sim: &mut Simulator) -> (ConnHandle, Protocol) {
        sim.plug_reader("Reader 1");
        sim.insert_card("Reader 1", vec![0x3B, 0x00]);
        sim.connect("Reader 1", ShareMode::Shared).unwrap()
    }

    #[test]
    fn single_response_with_no_continuation() {
        let mut sim = Simulator::new();
        let (handle, protocol) = connected(&mut sim);
        sim.script_response("Reader 1", vec![0x90, 0x00]);
        let hex = chained_transmit(&mut sim, handle, protocol, &[0x00, 0xA4, 0x04, 0x00]).unwrap();
        assert_eq!(hex, "9000");
    }

    #[test]
    fn chains_through_more_data() {
        let mut sim = Simulator::new();
        let (handle, protocol) = connected(&mut sim);
        sim.script_response("Reader 1", vec![0x61, 0x10]);
        let mut final_response = vec![0xAA; 16];
        final_response.extend_from_slice(&[0x90, 0x00]);
        sim.script_response("Reader 1", final_response);

        let hex = chained_transmit(&mut sim, handle, protocol, &[0x00, 0xA4, 0x04, 0x00]).unwrap();

        assert_eq!(hex.len(), 36);
        assert_eq!(hex, "AA".repeat(16) + "9000");
    }

    #[test]
    fn chains_through_multiple_continuations() {
        let mut sim = Simulator::new();
        let (handle, protocol) = connected(&mut sim);
        sim.script_response("Reader 1", vec![0x61, 0x02]);
        sim.script_response("Reader 1", vec![0x61, 0x02]);
        sim.script_response("Reader 1", vec![0xBB, 0xBB, 0x90, 0x00]);

        let hex = chained_transmit(&mut sim, handle, protocol, &[0x00]).unwrap();
        assert_eq!(hex, "BBBB9000");
    }
}
