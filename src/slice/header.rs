//! Binary serialization of the slice header block (§4.4, §6 "Wire
//! format").

use std::io::{self, Cursor, Read, Write};

use super::{Header, Tag};
use crate::{
    collaborators::{Block, ContentType},
    error::{Error, StructuralError},
    num::{itf8_size_of, ltf8_size_of, read_itf8, read_ltf8, write_itf8, write_ltf8},
    reference_context::ReferenceContext,
    validation::ValidationStringency,
    version::Version,
};

const MISSING: i32 = -1;
const MULTI_REF: i32 = -2;
const MD5_LEN: usize = 16;

/// Writes a slice header's payload to `writer` (§4.4 "Write").
///
/// This writes only the field sequence from §6 "Wire format"; wrapping the
/// bytes in a framed block (checksums, compression) is the external block
/// codec's job (§1 "Out of scope").
pub fn write_header<W>(writer: &mut W, version: Version, header: &Header) -> Result<(), Error>
where
    W: Write,
{
    let reference_context_id = header
        .reference_context
        .serializable_id()
        .ok_or(StructuralError::UninitializedContext)?;

    write_itf8(writer, reference_context_id)?;
    write_itf8(writer, header.alignment_start)?;
    write_itf8(writer, header.alignment_span)?;
    write_itf8(writer, header.record_count)?;
    write_ltf8(writer, header.global_record_counter)?;
    write_itf8(writer, header.block_count())?;

    write_itf8(writer, header.external_content_ids.len() as i32)?;
    for &id in &header.external_content_ids {
        write_itf8(writer, id)?;
    }

    write_itf8(writer, header.embedded_reference_content_id.unwrap_or(MISSING))?;

    let md5 = header.reference_md5.unwrap_or([0; MD5_LEN]);
    writer.write_all(&md5)?;

    if version.supports_tag_chain() {
        write_tag_chain(writer, &header.tags)?;
    }

    Ok(())
}

fn write_tag_chain<W>(writer: &mut W, tags: &[Tag]) -> io::Result<()>
where
    W: Write,
{
    write_itf8(writer, tags.len() as i32)?;

    for tag in tags {
        writer.write_all(&tag.key)?;
        writer.write_all(&[tag.value_type])?;
        write_itf8(writer, tag.value.len() as i32)?;
        writer.write_all(&tag.value)?;
    }

    Ok(())
}

/// The tag value type codes this crate recognizes (the BAM-style tag value
/// types: `A`, `c`, `C`, `s`, `S`, `i`, `I`, `f`, `Z`, `H`, `B`).
const KNOWN_TAG_VALUE_TYPES: &[u8] = b"AcCsSiIfZHB";

/// Reads a slice header block under [`ValidationStringency::Strict`]
/// (§4.4 "Read"). Most callers want this; use
/// [`read_header_with_stringency`] to tolerate malformed tags instead of
/// failing the whole header.
///
/// `block` must have already been read by the external block codec (§1
/// "Out of scope"); this only validates its declared content type and
/// parses its payload.
pub fn read_header(version: Version, block: &Block) -> Result<Header, Error> {
    read_header_with_stringency(version, block, ValidationStringency::Strict)
}

/// Reads a slice header block, applying `stringency` to tag-parsing errors
/// (§4.4 "Error conditions").
///
/// Content-type mismatch and truncation are always fatal regardless of
/// stringency. Only a malformed tag entry (an unrecognized value-type
/// code) is gated: [`ValidationStringency::Strict`] aborts the whole
/// header, [`ValidationStringency::Lenient`] and
/// [`ValidationStringency::Silent`] both drop the offending tag and keep
/// parsing the rest of the chain (this crate has no logging layer to
/// distinguish them further).
pub fn read_header_with_stringency(
    version: Version,
    block: &Block,
    stringency: ValidationStringency,
) -> Result<Header, Error> {
    if block.content_type != ContentType::MappedSliceHeader {
        return Err(StructuralError::ContentTypeMismatch.into());
    }

    let mut cursor = Cursor::new(block.data.as_slice());

    let reference_context_id = read_itf8(&mut cursor).map_err(truncated)?;
    let reference_context = match reference_context_id {
        MULTI_REF => ReferenceContext::MultiRef,
        -1 => ReferenceContext::Unmapped,
        id if id >= 0 => ReferenceContext::SingleRef(id as usize),
        _ => return Err(StructuralError::Truncated.into()),
    };

    let alignment_start = read_itf8(&mut cursor).map_err(truncated)?;
    let alignment_span = read_itf8(&mut cursor).map_err(truncated)?;
    let record_count = read_itf8(&mut cursor).map_err(truncated)?;
    let global_record_counter = read_ltf8(&mut cursor).map_err(truncated)?;
    let _block_count = read_itf8(&mut cursor).map_err(truncated)?;

    let external_content_id_count = read_itf8(&mut cursor).map_err(truncated)?;
    let mut external_content_ids = Vec::with_capacity(external_content_id_count.max(0) as usize);
    for _ in 0..external_content_id_count {
        external_content_ids.push(read_itf8(&mut cursor).map_err(truncated)?);
    }

    let embedded_reference_content_id = match read_itf8(&mut cursor).map_err(truncated)? {
        MISSING => None,
        id => Some(id),
    };

    let mut md5 = [0u8; MD5_LEN];
    cursor.read_exact(&mut md5).map_err(truncated)?;
    let reference_md5 = if md5 == [0; MD5_LEN] { None } else { Some(md5) };

    let tags = if version.supports_tag_chain() {
        read_tag_chain(&mut cursor, stringency)?
    } else {
        Vec::new()
    };

    if (cursor.position() as usize) < cursor.get_ref().len() {
        return Err(StructuralError::TrailingData.into());
    }

    Ok(Header {
        reference_context,
        alignment_start,
        alignment_span,
        record_count,
        global_record_counter,
        external_content_ids,
        embedded_reference_content_id,
        reference_md5,
        tags,
    })
}

fn read_tag_chain(
    cursor: &mut Cursor<&[u8]>,
    stringency: ValidationStringency,
) -> Result<Vec<Tag>, Error> {
    let count = read_itf8(cursor).map_err(truncated)?;
    let mut tags = Vec::with_capacity(count.max(0) as usize);

    for _ in 0..count {
        let mut key = [0u8; 2];
        cursor.read_exact(&mut key).map_err(truncated)?;

        let mut value_type = [0u8; 1];
        cursor.read_exact(&mut value_type).map_err(truncated)?;

        let len = read_itf8(cursor).map_err(truncated)?;
        let mut value = vec![0u8; len.max(0) as usize];
        cursor.read_exact(&mut value).map_err(truncated)?;

        if !KNOWN_TAG_VALUE_TYPES.contains(&value_type[0]) {
            match stringency {
                ValidationStringency::Strict => {
                    return Err(StructuralError::InvalidTagValueType(value_type[0]).into());
                }
                ValidationStringency::Lenient | ValidationStringency::Silent => continue,
            }
        }

        tags.push(Tag::new(key, value_type[0], value));
    }

    Ok(tags)
}

fn truncated(_: io::Error) -> Error {
    Error::Structural(StructuralError::Truncated)
}

/// The exact number of bytes [`write_header`] would emit for `header` under
/// `version`. Used by callers computing a slice's byte offset without
/// writing it twice.
pub fn size_of(version: Version, header: &Header) -> Result<usize, Error> {
    let reference_context_id = header
        .reference_context
        .serializable_id()
        .ok_or(StructuralError::UninitializedContext)?;

    let mut size = itf8_size_of(reference_context_id)
        + itf8_size_of(header.alignment_start)
        + itf8_size_of(header.alignment_span)
        + itf8_size_of(header.record_count)
        + ltf8_size_of(header.global_record_counter)
        + itf8_size_of(header.block_count())
        + itf8_size_of(header.external_content_ids.len() as i32);

    for &id in &header.external_content_ids {
        size += itf8_size_of(id);
    }

    size += itf8_size_of(header.embedded_reference_content_id.unwrap_or(MISSING));
    size += MD5_LEN;

    if version.supports_tag_chain() {
        size += itf8_size_of(header.tags.len() as i32);

        for tag in &header.tags {
            size += 2 + 1 + itf8_size_of(tag.value.len() as i32) + tag.value.len();
        }
    }

    Ok(size)
}
