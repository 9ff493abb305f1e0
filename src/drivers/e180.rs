// E180 payload codecs
//
// Raw acquisitions arrive as detector-module blocks, coincidence streams as
// event pairs, michelogram histograms as bare f32 words. Termination follows
// the same rule as the 930 codecs.

use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use tracing::trace;

use super::{ip_string, CodecError, Result};
use crate::bitwise::ByteCursor;

/// Wire size of one detector hit record.
pub const BDM_BODY_LEN: usize = 16;

/// One 16-byte detector hit.
///
/// Byte layout:
///   0      head and detector-unit packed index
///   1      detector module index
///   2-9    coarse timestamp ticks
///   10     crystal x
///   11     crystal y
///   12-13  energy channels
///   14     temperature, integer part
///   15     temperature fraction and frame tail marker
#[derive(Debug, Clone, PartialEq)]
pub struct BdmHit {
    pub head_du: u8,
    pub bdm: u8,
    pub time: [u8; 8],
    pub x: u8,
    pub y: u8,
    pub energy: [u8; 2],
    pub temperature: i8,
    pub temperature_tail: u8,
}

/// One detector-module transfer block: an addressing preamble plus a run of
/// hit records whose byte length is declared up front.
#[derive(Debug, Clone, PartialEq)]
pub struct BdmBlock {
    pub index: u8,
    pub ip: u16,
    pub port: u16,
    pub group_count: u8,
    pub group_index: u8,
    pub body: Vec<BdmHit>,
}

impl BdmBlock {
    pub fn ip_addr(&self) -> String {
        ip_string(self.ip)
    }

    /// Body byte length as written on the wire.
    pub fn data_len(&self) -> u32 {
        (self.body.len() * BDM_BODY_LEN) as u32
    }
}

/// One half of a coincidence pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CoinEvent {
    pub crystal_index: u32,
    pub energy: f32,
    pub time: f64,
}

/// Two single events detected in coincidence.
#[derive(Debug, Clone, PartialEq)]
pub struct CoinPair(pub [CoinEvent; 2]);

/// Lazily decode detector-module blocks from `cur` until the input runs out.
pub fn bdm_blocks(cur: ByteCursor) -> BdmBlocks {
    BdmBlocks { cur, done: false }
}

pub struct BdmBlocks<'a> {
    cur: ByteCursor<'a>,
    done: bool,
}

impl BdmBlocks<'_> {
    fn decode_hit(&mut self) -> Result<BdmHit> {
        let head_du = self.cur.read_u8()?;
        let bdm = self.cur.read_u8()?;
        let mut time = [0u8; 8];
        time.copy_from_slice(self.cur.read_bytes(8)?);
        let x = self.cur.read_u8()?;
        let y = self.cur.read_u8()?;
        let mut energy = [0u8; 2];
        energy.copy_from_slice(self.cur.read_bytes(2)?);
        Ok(BdmHit {
            head_du,
            bdm,
            time,
            x,
            y,
            energy,
            temperature: self.cur.read_i8()?,
            temperature_tail: self.cur.read_u8()?,
        })
    }

    fn decode_tail(&mut self, index: u8) -> Result<BdmBlock> {
        let ip = self.cur.read_u16()?;
        let port = self.cur.read_u16()?;
        let group_count = self.cur.read_u8()?;
        let group_index = self.cur.read_u8()?;
        let data_len = self.cur.read_u32()?;
        if data_len as usize % BDM_BODY_LEN != 0 {
            return Err(CodecError::InvalidBlockLength(data_len));
        }
        let count = data_len as usize / BDM_BODY_LEN;
        let mut body = Vec::with_capacity(count);
        for _ in 0..count {
            body.push(self.decode_hit()?);
        }
        trace!(index, hits = body.len(), "decoded detector block");
        Ok(BdmBlock {
            index,
            ip,
            port,
            group_count,
            group_index,
            body,
        })
    }
}

impl Iterator for BdmBlocks<'_> {
    type Item = Result<BdmBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let index = match self.cur.read_u8() {
            Ok(index) => index,
            Err(_) => {
                self.done = true;
                return None;
            }
        };
        match self.decode_tail(index) {
            Ok(block) => Some(Ok(block)),
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Lazily decode coincidence pairs from `cur` until the input runs out.
pub fn coin_pairs(cur: ByteCursor) -> CoinPairs {
    CoinPairs { cur, done: false }
}

pub struct CoinPairs<'a> {
    cur: ByteCursor<'a>,
    done: bool,
}

impl CoinPairs<'_> {
    fn decode_tail(&mut self, first_index: u32) -> Result<CoinPair> {
        let first = CoinEvent {
            crystal_index: first_index,
            energy: self.cur.read_f32()?,
            time: self.cur.read_f64()?,
        };
        let second = CoinEvent {
            crystal_index: self.cur.read_u32()?,
            energy: self.cur.read_f32()?,
            time: self.cur.read_f64()?,
        };
        Ok(CoinPair([first, second]))
    }
}

impl Iterator for CoinPairs<'_> {
    type Item = Result<CoinPair>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let first_index = match self.cur.read_u32() {
            Ok(index) => index,
            Err(_) => {
                self.done = true;
                return None;
            }
        };
        match self.decode_tail(first_index) {
            Ok(pair) => Some(Ok(pair)),
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Lazily decode michelogram samples from `cur`. A trailing partial word ends
/// the stream.
pub fn mich_samples(cur: ByteCursor) -> MichSamples {
    MichSamples { cur }
}

pub struct MichSamples<'a> {
    cur: ByteCursor<'a>,
}

impl Iterator for MichSamples<'_> {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        self.cur.read_f32().ok()
    }
}

/// Write detector-module blocks back to their wire form. The declared body
/// length is derived from the hit count.
pub fn encode_bdm<W: Write>(out: &mut W, blocks: &[BdmBlock]) -> io::Result<()> {
    for block in blocks {
        out.write_u8(block.index)?;
        out.write_u16::<LittleEndian>(block.ip)?;
        out.write_u16::<LittleEndian>(block.port)?;
        out.write_u8(block.group_count)?;
        out.write_u8(block.group_index)?;
        out.write_u32::<LittleEndian>(block.data_len())?;
        for hit in &block.body {
            out.write_u8(hit.head_du)?;
            out.write_u8(hit.bdm)?;
            out.write_all(&hit.time)?;
            out.write_u8(hit.x)?;
            out.write_u8(hit.y)?;
            out.write_all(&hit.energy)?;
            out.write_i8(hit.temperature)?;
            out.write_u8(hit.temperature_tail)?;
        }
    }
    Ok(())
}

/// Write coincidence pairs back to their wire form.
pub fn encode_coin<W: Write>(out: &mut W, pairs: &[CoinPair]) -> io::Result<()> {
    for CoinPair(events) in pairs {
        for event in events {
            out.write_u32::<LittleEndian>(event.crystal_index)?;
            out.write_f32::<LittleEndian>(event.energy)?;
            out.write_f64::<LittleEndian>(event.time)?;
        }
    }
    Ok(())
}

/// Write michelogram samples back to their wire form.
pub fn encode_mich<W: Write>(out: &mut W, samples: &[f32]) -> io::Result<()> {
    for &sample in samples {
        out.write_f32::<LittleEndian>(sample)?;
    }
    Ok(())
}
