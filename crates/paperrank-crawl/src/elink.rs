//! E-utilities `elink` response parser using quick-xml
//!
//! A response looks like:
//!
//! ```text
//! <eLinkResult>
//!   <LinkSet>
//!     <DbFrom>pubmed</DbFrom>
//!     <IdList><Id>21876761</Id></IdList>
//!     <LinkSetDb>
//!       <DbTo>pubmed</DbTo>
//!       <LinkName>pubmed_pubmed_citedin</LinkName>
//!       <Link><Id>30001234</Id></Link>
//!     </LinkSetDb>
//!   </LinkSet>
//! </eLinkResult>
//! ```
//!
//! Requesting ids as repeated `id=` parameters yields one `LinkSet` per id.

use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::Event;

/// Link name for papers citing the source PMID (inbound)
pub const LINK_CITED_IN: &str = "pubmed_pubmed_citedin";
/// Link name for papers the source PMID cites (outbound)
pub const LINK_REFS: &str = "pubmed_pubmed_refs";

/// One `<LinkSet>`: the raw citation unit for (normally) one PMID
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LinkSet {
    /// Source ids from `<IdList>`
    pub ids: Vec<String>,
    pub link_dbs: Vec<LinkSetDb>,
    /// Text of an `<ERROR>` element inside the linkset
    pub error: Option<String>,
}

/// One `<LinkSetDb>`: linked ids under a single link name
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LinkSetDb {
    pub link_name: String,
    pub links: Vec<String>,
}

impl LinkSet {
    /// Well-formed linkset for `pmid` with the given references and citers.
    ///
    /// Empty link lists are omitted, as the API omits them.
    pub fn for_pmid(pmid: &str, refs: &[&str], cited_in: &[&str]) -> Self {
        let link_dbs = [(LINK_REFS, refs), (LINK_CITED_IN, cited_in)]
            .into_iter()
            .filter(|(_, links)| !links.is_empty())
            .map(|(name, links)| LinkSetDb {
                link_name: name.to_string(),
                links: links.iter().map(|s| s.to_string()).collect(),
            })
            .collect();
        Self {
            ids: vec![pmid.to_string()],
            link_dbs,
            error: None,
        }
    }
}

/// Parse an `elink` response into its linksets.
///
/// Fails when the document is not XML, has no `<eLinkResult>` root, or the
/// root holds no `<LinkSet>` (e.g. only a top-level `<ERROR>`).
pub fn parse_elink_xml(xml: &str) -> Result<Vec<LinkSet>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut found_root = false;
    let mut top_error: Option<String> = None;
    let mut linksets = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"eLinkResult" => found_root = true,
                b"LinkSet" if found_root => linksets.push(parse_linkset(&mut reader)?),
                b"ERROR" if found_root => top_error = Some(read_text(&mut reader)?),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e).context("XML parse error"),
            _ => {}
        }
        buf.clear();
    }

    anyhow::ensure!(found_root, "response has no eLinkResult element");
    if linksets.is_empty() {
        match top_error {
            Some(msg) => anyhow::bail!("eLinkResult has no LinkSet (ERROR: {msg})"),
            None => anyhow::bail!("eLinkResult has no LinkSet"),
        }
    }
    Ok(linksets)
}

fn parse_linkset(reader: &mut Reader<&[u8]>) -> Result<LinkSet> {
    let mut linkset = LinkSet::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"IdList" => linkset.ids = parse_id_list(reader, b"IdList")?,
                b"LinkSetDb" => linkset.link_dbs.push(parse_linkset_db(reader)?),
                b"ERROR" => linkset.error = Some(read_text(reader)?),
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"LinkSet" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(linkset)
}

fn parse_linkset_db(reader: &mut Reader<&[u8]>) -> Result<LinkSetDb> {
    let mut db = LinkSetDb::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"LinkName" => db.link_name = read_text(reader)?,
                b"Link" => db.links.extend(parse_id_list(reader, b"Link")?),
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"LinkSetDb" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(db)
}

/// Collect `<Id>` values until the closing `end_tag`.
fn parse_id_list(reader: &mut Reader<&[u8]>, end_tag: &[u8]) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"Id" => {
                let id = read_text(reader)?;
                let id = id.trim();
                if !id.is_empty() {
                    ids.push(id.to_string());
                }
            }
            Event::End(e) if e.name().as_ref() == end_tag => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(ids)
}

fn read_text(reader: &mut Reader<&[u8]>) -> Result<String> {
    let mut buf = Vec::new();
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(e) => text.push_str(&e.unescape()?),
            Event::End(_) => break,
            Event::Start(_) => text.push_str(&read_text(reader)?),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}
