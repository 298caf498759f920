//! Outbound event records.
//!
//! A record is the 12-byte handler id, a `u32` event kind, then the fields
//! of that kind. Click carries nothing more (16 bytes); pointer movement
//! carries `x` and `y` as `f64` (32 bytes).

use patchwire_buffers::{Cursor, Writer};
use serde::Serialize;

use crate::codec::{Decode, Encode};
use crate::enums::EventKind;
use crate::error::DecodeError;
use crate::tree::HandlerId;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    Click,
    PointerMove { x: f64, y: f64 },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Click => EventKind::Click,
            Event::PointerMove { .. } => EventKind::PointerMove,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EventRecord {
    pub handler: HandlerId,
    pub event: Event,
}

impl EventRecord {
    pub const CLICK_LEN: usize = HandlerId::LEN + 4;
    pub const POINTER_MOVE_LEN: usize = Self::CLICK_LEN + 16;

    pub fn new(handler: HandlerId, event: Event) -> Self {
        Self { handler, event }
    }

    /// Serializes the record into a fresh buffer of its exact length.
    pub fn to_bytes(&self) -> Vec<u8> {
        let len = match self.event {
            Event::Click => Self::CLICK_LEN,
            Event::PointerMove { .. } => Self::POINTER_MOVE_LEN,
        };
        let mut writer = Writer::with_capacity(len);
        self.encode(&mut writer);
        writer.into_vec()
    }

    /// Decodes a complete record, rejecting trailing bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, DecodeError> {
        crate::decode_message(data)
    }
}

impl Encode for EventRecord {
    fn encode(&self, writer: &mut Writer) {
        writer.buf(self.handler.as_bytes());
        writer.u32(self.event.kind().as_u32());
        if let Event::PointerMove { x, y } = self.event {
            writer.f64(x);
            writer.f64(y);
        }
    }
}

impl Decode for EventRecord {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        let handler = HandlerId(cursor.array()?);
        let tag = cursor.u32()?;
        let event = match EventKind::from_u32(tag).ok_or(DecodeError::unknown("event kind", tag))? {
            EventKind::Click => Event::Click,
            EventKind::PointerMove => Event::PointerMove {
                x: cursor.f64()?,
                y: cursor.f64()?,
            },
        };
        Ok(EventRecord { handler, event })
    }
}
