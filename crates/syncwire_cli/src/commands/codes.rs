//! Codes command implementation.

use syncwire_protocol::{Flow, MessageCode, StatusFlag, STATE_PACKET_TYPE};

/// Prints every message code, status flag and flow code.
pub fn run() {
    println!("Message codes:");
    for message in MessageCode::ALL {
        println!("  {:>4}  {}", message.code(), message);
    }

    println!();
    println!("Status flags:");
    for flag in (0..).map_while(StatusFlag::from_code) {
        println!("  {:>4}  {:?}", flag.code(), flag);
    }

    println!();
    println!("Flows:");
    for flow in [Flow::Unknown, Flow::Push, Flow::Pull] {
        println!("  {:>4}  {}", flow.code(), flow);
    }

    println!();
    println!(
        "Control packet type: {}/{}",
        STATE_PACKET_TYPE.category, STATE_PACKET_TYPE.subtype
    );
}
