use crate::conn::TcpClient;
use crate::ScnpResult;
use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};

// The raw 14-byte client introduction that precedes all packet traffic.
// The 8-byte answer carries the server's product and protocol versions.
pub fn send_and_receive(tcp: &mut TcpClient) -> ScnpResult<((i8, u16), (i8, u16))> {
    const FILLER: i32 = -1;
    const MAJOR_PRODUCT_VERSION: i8 = 4;
    const MINOR_PRODUCT_VERSION: i16 = 20;
    const MAJOR_PROTOCOL_VERSION: i8 = 4;
    const MINOR_PROTOCOL_VERSION: i16 = 1;
    const RESERVED: i8 = 0;
    const NUMBER_OF_OPTIONS: i8 = 1;
    const OPTION_ID_SWAPKIND: i8 = 1;
    const LITTLE_ENDIAN: i8 = 1;

    let mut w = Vec::<u8>::with_capacity(14);
    w.write_i32::<BigEndian>(FILLER)?;
    w.write_i8(MAJOR_PRODUCT_VERSION)?;
    w.write_i16::<BigEndian>(MINOR_PRODUCT_VERSION)?;
    w.write_i8(MAJOR_PROTOCOL_VERSION)?;
    w.write_i16::<BigEndian>(MINOR_PROTOCOL_VERSION)?;
    w.write_i8(RESERVED)?;
    w.write_i8(NUMBER_OF_OPTIONS)?;
    w.write_i8(OPTION_ID_SWAPKIND)?;
    w.write_i8(LITTLE_ENDIAN)?;
    tcp.write_all(&w)?;

    let reply = tcp.read_exact(8)?;
    #[allow(clippy::cast_possible_wrap)]
    let product_version = (reply[0] as i8, LittleEndian::read_u16(&reply[1..3]));
    #[allow(clippy::cast_possible_wrap)]
    let protocol_version = (reply[3] as i8, LittleEndian::read_u16(&reply[4..6]));
    debug!(
        "protocol initialized, server product version {:?}, protocol version {:?}",
        product_version, protocol_version
    );
    Ok((product_version, protocol_version))
}
