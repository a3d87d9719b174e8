//! Wire-frame builders for the ITCH subset the engine consumes.
//!
//! Every frame: type byte, stock-locate u16, tracking-number u16,
//! 6-byte timestamp, then the per-type fields, all little-endian.

fn push_u16(msg: &mut Vec<u8>, value: u16) {
    msg.extend_from_slice(&value.to_le_bytes());
}

fn push_u32(msg: &mut Vec<u8>, value: u32) {
    msg.extend_from_slice(&value.to_le_bytes());
}

fn push_u48(msg: &mut Vec<u8>, value: u64) {
    msg.extend_from_slice(&value.to_le_bytes()[..6]);
}

fn push_u64(msg: &mut Vec<u8>, value: u64) {
    msg.extend_from_slice(&value.to_le_bytes());
}

fn header(msg_type: u8, timestamp: u64) -> Vec<u8> {
    let mut msg = vec![msg_type];
    push_u16(&mut msg, 1); // stock locate
    push_u16(&mut msg, 0); // tracking number
    push_u48(&mut msg, timestamp);
    msg
}

/// `A` - Add Order, 36 bytes.
pub fn build_add(order_id: u64, price: u32, qty: u32, side: u8, timestamp: u64) -> Vec<u8> {
    let mut msg = header(b'A', timestamp);
    push_u64(&mut msg, order_id);
    msg.push(side);
    push_u32(&mut msg, qty);
    msg.extend_from_slice(b"TEST    "); // stock symbol, ignored
    push_u32(&mut msg, price);
    debug_assert_eq!(msg.len(), 36);
    msg
}

/// `X` - Order Cancel, 23 bytes.
pub fn build_cancel(order_id: u64, cancelled_qty: u32) -> Vec<u8> {
    let mut msg = header(b'X', 0);
    push_u64(&mut msg, order_id);
    push_u32(&mut msg, cancelled_qty);
    debug_assert_eq!(msg.len(), 23);
    msg
}

/// `E` - Order Executed, 31 bytes.
pub fn build_execute(order_id: u64, qty: u32) -> Vec<u8> {
    let mut msg = header(b'E', 0);
    push_u64(&mut msg, order_id);
    push_u32(&mut msg, qty);
    push_u64(&mut msg, 0); // match number, ignored
    debug_assert_eq!(msg.len(), 31);
    msg
}

/// `U` - Order Replace, 35 bytes.
pub fn build_replace(
    original_order_id: u64,
    new_order_id: u64,
    qty: u32,
    price: u32,
    timestamp: u64,
) -> Vec<u8> {
    let mut msg = header(b'U', timestamp);
    push_u64(&mut msg, original_order_id);
    push_u64(&mut msg, new_order_id);
    push_u32(&mut msg, qty);
    push_u32(&mut msg, price);
    debug_assert_eq!(msg.len(), 35);
    msg
}
