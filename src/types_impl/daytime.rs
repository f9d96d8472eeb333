//! Wire formats for DATE, TIME, and TIMESTAMP.
//!
//! DATE packs year/month/day into 4 bytes, with the high bit of the second
//! byte acting as the non-NULL flag. TIME packs hour/minute and a
//! milliseconds-of-minute u16 into 4 bytes, with the high bit of the hour
//! byte as the non-NULL flag. TIMESTAMP is DATE followed by TIME.

use crate::protocol::util;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::io;

pub fn parse_date(rdr: &mut dyn io::Read) -> io::Result<Option<NaiveDate>> {
    let b = util::parse_bytes(4, rdr)?;
    if b[1] & 0x80 == 0 {
        return Ok(None);
    }
    let year = i32::from(b[0]) | (i32::from(b[1] & 0x3F) << 8);
    let month = u32::from(b[2]) + 1;
    let day = u32::from(b[3]);
    NaiveDate::from_ymd_opt(year, month, day)
        .map(Some)
        .ok_or_else(|| util::io_error(format!("invalid date on wire: {year}-{month}-{day}")))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn emit_date(date: &NaiveDate, w: &mut dyn io::Write) -> io::Result<()> {
    w.write_u16::<LittleEndian>(date.year() as u16 | 0x8000)?;
    w.write_u8(date.month() as u8 - 1)?;
    w.write_u8(date.day() as u8)?;
    Ok(())
}

pub fn parse_time(rdr: &mut dyn io::Read) -> io::Result<Option<NaiveTime>> {
    let hour = rdr.read_u8()?;
    let minute = rdr.read_u8()?;
    let millis = rdr.read_u16::<LittleEndian>()?;
    if hour & 0x80 == 0 {
        return Ok(None);
    }
    let (second, milli) = (u32::from(millis) / 1000, u32::from(millis) % 1000);
    NaiveTime::from_hms_milli_opt(u32::from(hour & 0x7F), u32::from(minute), second, milli)
        .map(Some)
        .ok_or_else(|| util::io_error(format!("invalid time on wire: {hour}:{minute}:{millis}")))
}

#[allow(clippy::cast_possible_truncation)]
pub fn emit_time(time: &NaiveTime, w: &mut dyn io::Write) -> io::Result<()> {
    w.write_u8(time.hour() as u8 | 0x80)?;
    w.write_u8(time.minute() as u8)?;
    let millis = time.second() * 1000 + time.nanosecond() / 1_000_000;
    w.write_u16::<LittleEndian>(millis as u16)?;
    Ok(())
}

pub fn parse_timestamp(rdr: &mut dyn io::Read) -> io::Result<Option<NaiveDateTime>> {
    let o_date = parse_date(rdr)?;
    let o_time = parse_time(rdr)?;
    Ok(match (o_date, o_time) {
        (Some(date), Some(time)) => Some(date.and_time(time)),
        _ => None,
    })
}

pub fn emit_timestamp(ts: &NaiveDateTime, w: &mut dyn io::Write) -> io::Result<()> {
    emit_date(&ts.date(), w)?;
    emit_time(&ts.time(), w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    #[test]
    fn date_round_trip() {
        let date = NaiveDate::from_ymd_opt(2015, 2, 28).unwrap();
        let mut buf = Vec::new();
        emit_date(&date, &mut buf).unwrap();
        assert_eq!(buf.len(), 4);
        assert_eq!(parse_date(&mut &buf[..]).unwrap(), Some(date));
    }

    #[test]
    fn null_date() {
        let buf = [0_u8; 4];
        assert_eq!(parse_date(&mut &buf[..]).unwrap(), None);
    }

    #[test]
    fn time_round_trip_keeps_millis() {
        let time = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap();
        let mut buf = Vec::new();
        emit_time(&time, &mut buf).unwrap();
        assert_eq!(buf.len(), 4);
        assert_eq!(parse_time(&mut &buf[..]).unwrap(), Some(time));
    }

    #[test]
    fn timestamp_round_trip() {
        let ts = NaiveDate::from_ymd_opt(1999, 12, 31)
            .unwrap()
            .and_hms_milli_opt(12, 30, 15, 250)
            .unwrap();
        let mut buf = Vec::new();
        emit_timestamp(&ts, &mut buf).unwrap();
        assert_eq!(buf.len(), 8);
        assert_eq!(parse_timestamp(&mut &buf[..]).unwrap(), Some(ts));
    }
}
