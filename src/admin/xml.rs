//! XML payloads exchanged with the admin API.
//!
//! Requests carry an `<Account>` document; responses are the S3
//! `ListAllMyBucketsResult` and `AccessControlPolicy` documents. Unknown
//! elements are skipped and namespace prefixes ignored.

#![allow(missing_docs)]

use std::io::{self, Write};

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesText, Event};
use serde::Serialize;

use crate::accounts::User;
use crate::core::errors::{Result, VgwError};

/// One entry of the API's bucket listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApiBucket {
    pub name: String,
    pub creation_date: String,
    /// May be empty when the gateway does not report it.
    pub owner: String,
}

/// Encode an account as `<Account>` with `ProjectID` omitted when zero.
pub fn encode_account(user: &User) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(256);
    let mut writer = Writer::new(&mut buf);
    writer
        .create_element("Account")
        .write_inner_content(|w| {
            write_text_element(w, "Access", &user.access)?;
            write_text_element(w, "Secret", &user.secret)?;
            write_text_element(w, "Role", &user.role)?;
            write_text_element(w, "UserID", &user.user_id.to_string())?;
            write_text_element(w, "GroupID", &user.group_id.to_string())?;
            if user.project_id != 0 {
                write_text_element(w, "ProjectID", &user.project_id.to_string())?;
            }
            Ok(())
        })
        .map_err(|error| VgwError::Serialization {
            context: "account xml",
            details: error.to_string(),
        })?;
    Ok(buf)
}

fn write_text_element<W: Write>(writer: &mut Writer<W>, tag: &str, text: &str) -> io::Result<()> {
    writer
        .create_element(tag)
        .write_text_content(BytesText::new(text))?;
    Ok(())
}

/// Parse `ListAllMyBucketsResult/Buckets/Bucket*`.
pub fn decode_bucket_list(body: &[u8]) -> Result<Vec<ApiBucket>> {
    let mut reader = root_reader(body)?;
    let mut buckets = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => match local_name(e.local_name().as_ref())? {
                "Buckets" => {}
                "Bucket" => buckets.push(read_bucket(&mut reader)?),
                _ => skip_element(&mut reader)?,
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(buckets)
}

/// Owner identifier from `AccessControlPolicy/Owner/ID`. Empty when absent.
pub fn decode_acl_owner(body: &[u8]) -> Result<String> {
    let mut reader = root_reader(body)?;
    loop {
        match reader.read_event()? {
            Event::Start(e) => match local_name(e.local_name().as_ref())? {
                "Owner" => return read_owner(&mut reader),
                _ => skip_element(&mut reader)?,
            },
            Event::End(_) | Event::Eof => return Ok(String::new()),
            _ => {}
        }
    }
}

/// Position a reader just inside the document's root element.
fn root_reader(body: &[u8]) -> Result<Reader<&[u8]>> {
    let mut reader = Reader::from_reader(body);
    reader.config_mut().trim_text(true);
    loop {
        match reader.read_event()? {
            Event::Start(_) => return Ok(reader),
            Event::Eof => return Err(parse_error("missing root element")),
            _ => {}
        }
    }
}

fn read_bucket(reader: &mut Reader<&[u8]>) -> Result<ApiBucket> {
    let mut bucket = ApiBucket::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) => match local_name(e.local_name().as_ref())? {
                "Name" => bucket.name = read_text_content(reader)?,
                "CreationDate" => bucket.creation_date = read_text_content(reader)?,
                "Owner" => bucket.owner = read_owner(reader)?,
                _ => skip_element(reader)?,
            },
            Event::End(_) => return Ok(bucket),
            Event::Eof => return Err(parse_error("unexpected EOF in Bucket")),
            _ => {}
        }
    }
}

/// Accepts both `<Owner>bob</Owner>` and `<Owner><ID>bob</ID>...</Owner>`.
fn read_owner(reader: &mut Reader<&[u8]>) -> Result<String> {
    let mut text = String::new();
    let mut id = None;
    loop {
        match reader.read_event()? {
            Event::Text(e) => text.push_str(&unescape_text(&e)?),
            Event::Start(e) => match local_name(e.local_name().as_ref())? {
                "ID" => id = Some(read_text_content(reader)?),
                _ => skip_element(reader)?,
            },
            Event::End(_) => return Ok(id.unwrap_or(text).trim().to_string()),
            Event::Eof => return Err(parse_error("unexpected EOF in Owner")),
            _ => {}
        }
    }
}

fn read_text_content(reader: &mut Reader<&[u8]>) -> Result<String> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(e) => text.push_str(&unescape_text(&e)?),
            Event::Start(_) => skip_element(reader)?,
            Event::End(_) => return Ok(text),
            Event::Eof => return Err(parse_error("unexpected EOF while reading text")),
            _ => {}
        }
    }
}

fn skip_element(reader: &mut Reader<&[u8]>) -> Result<()> {
    let mut depth: u32 = 1;
    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => return Err(parse_error("unexpected EOF while skipping element")),
            _ => {}
        }
    }
}

fn unescape_text(e: &BytesText<'_>) -> Result<String> {
    let decoded = e.decode().map_err(|err| parse_error(&err.to_string()))?;
    let unescaped =
        quick_xml::escape::unescape(&decoded).map_err(|err| parse_error(&err.to_string()))?;
    Ok(unescaped.into_owned())
}

fn local_name(raw: &[u8]) -> Result<&str> {
    std::str::from_utf8(raw).map_err(|err| parse_error(&err.to_string()))
}

fn parse_error(details: &str) -> VgwError {
    VgwError::Parse {
        context: "xml",
        details: details.to_string(),
    }
}
