// DigitMI-930 payload codecs
//
// Three record streams share one termination rule: running out of input at a
// record boundary (or inside the first field) ends the stream cleanly, while
// a record cut off after its first field is corrupt data.

use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use super::{ip_string, Result};
use crate::bitwise::ByteCursor;

/// Detector sample bytes in one raw frame.
pub const RAW_FRAME_DATA_LEN: usize = 1152;

/// One raw acquisition frame: a fixed-size sample block followed by the low
/// half of the source address. `data` holds [`RAW_FRAME_DATA_LEN`] bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    pub data: Vec<u8>,
    pub ip: u16,
}

impl RawFrame {
    pub fn ip_addr(&self) -> String {
        ip_string(self.ip)
    }
}

/// One coincidence event from a listmode stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ListmodeEvent {
    pub ip: u16,
    pub xtalk: bool,
    pub reserved: u8,
    pub channel: u16,
    pub energy: f32,
    pub time: f64,
}

impl ListmodeEvent {
    pub fn ip_addr(&self) -> String {
        ip_string(self.ip)
    }

    pub fn channel_word(&self) -> u16 {
        pack_channel_word(self.xtalk, self.reserved, self.channel)
    }
}

/// Pack the listmode channel word.
///
/// Bit layout:
///   bit  15     cross-talk flag
///   bits 14-12  reserved counter
///   bits 11-0   channel index
pub fn pack_channel_word(xtalk: bool, reserved: u8, channel: u16) -> u16 {
    let mut word = channel & 0x0FFF;
    word |= u16::from(reserved & 0x07) << 12;
    if xtalk {
        word |= 1 << 15;
    }
    word
}

/// Split a channel word into (xtalk, reserved, channel).
pub fn unpack_channel_word(word: u16) -> (bool, u8, u16) {
    let xtalk = word & (1 << 15) != 0;
    let reserved = ((word >> 12) & 0x07) as u8;
    let channel = word & 0x0FFF;
    (xtalk, reserved, channel)
}

/// Lazily decode raw frames from `cur` until the input runs out.
pub fn raw_frames(cur: ByteCursor) -> RawFrames {
    RawFrames { cur, done: false }
}

pub struct RawFrames<'a> {
    cur: ByteCursor<'a>,
    done: bool,
}

impl Iterator for RawFrames<'_> {
    type Item = Result<RawFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        // A missing or partial sample block is the end of the capture.
        let data = match self.cur.read_bytes(RAW_FRAME_DATA_LEN) {
            Ok(block) => block.to_vec(),
            Err(_) => {
                self.done = true;
                return None;
            }
        };
        match self.cur.read_u16() {
            Ok(ip) => Some(Ok(RawFrame { data, ip })),
            Err(err) => {
                self.done = true;
                Some(Err(err.into()))
            }
        }
    }
}

/// Lazily decode listmode events from `cur` until the input runs out.
pub fn listmode_events(cur: ByteCursor) -> ListmodeEvents {
    ListmodeEvents { cur, done: false }
}

pub struct ListmodeEvents<'a> {
    cur: ByteCursor<'a>,
    done: bool,
}

impl ListmodeEvents<'_> {
    fn decode_tail(&mut self, ip: u16) -> Result<ListmodeEvent> {
        let (xtalk, reserved, channel) = unpack_channel_word(self.cur.read_u16()?);
        Ok(ListmodeEvent {
            ip,
            xtalk,
            reserved,
            channel,
            energy: self.cur.read_f32()?,
            time: self.cur.read_f64()?,
        })
    }
}

impl Iterator for ListmodeEvents<'_> {
    type Item = Result<ListmodeEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let ip = match self.cur.read_u16() {
            Ok(ip) => ip,
            Err(_) => {
                self.done = true;
                return None;
            }
        };
        match self.decode_tail(ip) {
            Ok(event) => Some(Ok(event)),
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Lazily decode michelogram bin words from `cur`. A trailing partial word
/// ends the stream.
pub fn mich_words(cur: ByteCursor) -> MichWords {
    MichWords { cur }
}

pub struct MichWords<'a> {
    cur: ByteCursor<'a>,
}

impl Iterator for MichWords<'_> {
    type Item = u16;

    fn next(&mut self) -> Option<Self::Item> {
        self.cur.read_u16().ok()
    }
}

/// Write raw frames back to their wire form.
pub fn encode_raw<W: Write>(out: &mut W, frames: &[RawFrame]) -> io::Result<()> {
    for frame in frames {
        out.write_all(&frame.data)?;
        out.write_u16::<LittleEndian>(frame.ip)?;
    }
    Ok(())
}

/// Write listmode events back to their wire form.
pub fn encode_listmode<W: Write>(out: &mut W, events: &[ListmodeEvent]) -> io::Result<()> {
    for event in events {
        out.write_u16::<LittleEndian>(event.ip)?;
        out.write_u16::<LittleEndian>(event.channel_word())?;
        out.write_f32::<LittleEndian>(event.energy)?;
        out.write_f64::<LittleEndian>(event.time)?;
    }
    Ok(())
}

/// Write michelogram bin words back to their wire form.
pub fn encode_mich<W: Write>(out: &mut W, words: &[u16]) -> io::Result<()> {
    for &word in words {
        out.write_u16::<LittleEndian>(word)?;
    }
    Ok(())
}
