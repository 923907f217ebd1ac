//! CalDAV request bodies and multistatus parsing.

use anyhow::{Context, Result};
use roxmltree::{Document, Node};

const CALDAV_NS: &str = "urn:ietf:params:xml:ns:caldav";

pub const PRINCIPAL_PROPFIND: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<d:propfind xmlns:d="DAV:">
  <d:prop>
    <d:current-user-principal/>
  </d:prop>
</d:propfind>"#;

pub const HOME_SET_PROPFIND: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<d:propfind xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:prop>
    <c:calendar-home-set/>
  </d:prop>
</d:propfind>"#;

pub const COLLECTIONS_PROPFIND: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<d:propfind xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:prop>
    <d:displayname/>
    <d:resourcetype/>
    <c:supported-calendar-component-set/>
  </d:prop>
</d:propfind>"#;

pub const DISPLAY_NAME_PROPFIND: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<d:propfind xmlns:d="DAV:">
  <d:prop>
    <d:displayname/>
  </d:prop>
</d:propfind>"#;

/// `calendar-query` REPORT for VEVENTs, optionally limited to a time range.
///
/// `range` bounds are in CalDAV format: `YYYYMMDDTHHMMSSZ`.
pub fn calendar_query(range: Option<(&str, &str)>) -> String {
    let filter = match range {
        Some((start, end)) => format!(
            r#"<C:comp-filter name="VEVENT">
                <C:time-range start="{start}" end="{end}"/>
            </C:comp-filter>"#
        ),
        None => r#"<C:comp-filter name="VEVENT"/>"#.to_string(),
    };

    format!(
        r#"<C:calendar-query xmlns="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
    <prop>
        <getetag/>
        <C:calendar-data/>
    </prop>
    <C:filter>
        <C:comp-filter name="VCALENDAR">
            {filter}
        </C:comp-filter>
    </C:filter>
</C:calendar-query>"#
    )
}

pub fn mkcalendar(display_name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<c:mkcalendar xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:set>
    <d:prop>
      <d:displayname>{}</d:displayname>
      <c:supported-calendar-component-set>
        <c:comp name="VEVENT"/>
      </c:supported-calendar-component-set>
    </d:prop>
  </d:set>
</c:mkcalendar>"#,
        escape(display_name)
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// A fetched calendar object with its ICS data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarResource {
    pub href: String,
    pub etag: Option<String>,
    pub data: String,
}

/// A collection listed under a calendar home.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub href: String,
    pub display_name: Option<String>,
    pub is_calendar: bool,
    /// False for task-only lists (iCloud Reminders).
    pub holds_events: bool,
}

fn named<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.descendants().find(|n| n.tag_name().name() == name)
}

fn text_of(node: Node<'_, '_>, name: &str) -> Option<String> {
    named(node, name)
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn responses<'a, 'input>(doc: &'a Document<'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    doc.root_element()
        .descendants()
        .filter(|n| n.tag_name().name() == "response")
}

/// Parse calendar resources from a `calendar-query` multistatus response.
pub fn parse_calendar_resources(body: &str) -> Result<Vec<CalendarResource>> {
    let doc = Document::parse(body).context("Invalid multistatus XML")?;

    let resources = responses(&doc)
        .filter_map(|response| {
            Some(CalendarResource {
                href: text_of(response, "href")?,
                etag: text_of(response, "getetag"),
                data: named(response, "calendar-data")?.text()?.to_string(),
            })
        })
        .collect();

    Ok(resources)
}

/// The `href` inside the first `property` element (e.g. `current-user-principal`).
pub fn find_property_href(body: &str, property: &str) -> Result<Option<String>> {
    let doc = Document::parse(body).context("Invalid multistatus XML")?;
    Ok(named(doc.root_element(), property).and_then(|prop| text_of(prop, "href")))
}

pub fn find_display_name(body: &str) -> Result<Option<String>> {
    let doc = Document::parse(body).context("Invalid multistatus XML")?;
    Ok(text_of(doc.root_element(), "displayname"))
}

pub fn parse_collections(body: &str) -> Result<Vec<Collection>> {
    let doc = Document::parse(body).context("Invalid multistatus XML")?;

    let collections = responses(&doc)
        .filter_map(|response| {
            let href = text_of(response, "href")?;
            let is_calendar = named(response, "resourcetype").is_some_and(|rt| {
                rt.children()
                    .any(|c| c.tag_name().name() == "calendar" && c.tag_name().namespace() == Some(CALDAV_NS))
            });
            let holds_events = match named(response, "supported-calendar-component-set") {
                Some(set) if set.children().any(|c| c.is_element()) => set
                    .children()
                    .filter(|c| c.tag_name().name() == "comp")
                    .any(|c| c.attribute("name") == Some("VEVENT")),
                _ => true,
            };

            Some(Collection {
                href,
                display_name: text_of(response, "displayname"),
                is_calendar,
                holds_events,
            })
        })
        .collect();

    Ok(collections)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<multistatus xmlns="DAV:">
  <response>
    <href>/123/calendars/work/shift-20251103-1000-1800-1a2b3c4d.ics</href>
    <propstat>
      <prop>
        <getetag>"abc"</getetag>
        <calendar-data xmlns="urn:ietf:params:xml:ns:caldav">BEGIN:VCALENDAR
END:VCALENDAR
</calendar-data>
      </prop>
      <status>HTTP/1.1 200 OK</status>
    </propstat>
  </response>
  <response>
    <href>/123/calendars/work/</href>
    <propstat>
      <prop><getetag>"ctag"</getetag></prop>
      <status>HTTP/1.1 200 OK</status>
    </propstat>
  </response>
</multistatus>"#;

    const HOME_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<d:multistatus xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:response>
    <d:href>/123/calendars/</d:href>
    <d:propstat><d:prop>
      <d:resourcetype><d:collection/></d:resourcetype>
    </d:prop></d:propstat>
  </d:response>
  <d:response>
    <d:href>/123/calendars/work/</d:href>
    <d:propstat><d:prop>
      <d:displayname>Work &amp; Shifts</d:displayname>
      <d:resourcetype><d:collection/><c:calendar/></d:resourcetype>
      <c:supported-calendar-component-set><c:comp name="VEVENT"/></c:supported-calendar-component-set>
    </d:prop></d:propstat>
  </d:response>
  <d:response>
    <d:href>/123/calendars/tasks/</d:href>
    <d:propstat><d:prop>
      <d:displayname>Reminders</d:displayname>
      <d:resourcetype><d:collection/><c:calendar/></d:resourcetype>
      <c:supported-calendar-component-set><c:comp name="VTODO"/></c:supported-calendar-component-set>
    </d:prop></d:propstat>
  </d:response>
</d:multistatus>"#;

    #[test]
    fn test_parse_calendar_resources_skips_entries_without_data() {
        let resources = parse_calendar_resources(REPORT_RESPONSE).unwrap();

        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].href, "/123/calendars/work/shift-20251103-1000-1800-1a2b3c4d.ics");
        assert_eq!(resources[0].etag.as_deref(), Some("\"abc\""));
        assert!(resources[0].data.starts_with("BEGIN:VCALENDAR"));
    }

    #[test]
    fn test_parse_collections() {
        let collections = parse_collections(HOME_RESPONSE).unwrap();

        assert_eq!(collections.len(), 3);
        assert!(!collections[0].is_calendar);

        assert!(collections[1].is_calendar);
        assert!(collections[1].holds_events);
        assert_eq!(collections[1].display_name.as_deref(), Some("Work & Shifts"));

        assert!(collections[2].is_calendar);
        assert!(!collections[2].holds_events);
    }

    #[test]
    fn test_find_property_href() {
        let body = r#"<?xml version="1.0"?>
<multistatus xmlns="DAV:">
  <response>
    <href>/</href>
    <propstat><prop>
      <current-user-principal><href>/123/principal/</href></current-user-principal>
    </prop></propstat>
  </response>
</multistatus>"#;

        assert_eq!(
            find_property_href(body, "current-user-principal").unwrap().as_deref(),
            Some("/123/principal/")
        );
        assert_eq!(find_property_href(body, "calendar-home-set").unwrap(), None);
    }

    #[test]
    fn test_invalid_xml_is_error() {
        assert!(parse_calendar_resources("<multistatus").is_err());
    }

    #[test]
    fn test_calendar_query_with_and_without_range() {
        let ranged = calendar_query(Some(("20251101T000000Z", "20251201T000000Z")));
        assert!(ranged.contains(r#"<C:time-range start="20251101T000000Z" end="20251201T000000Z"/>"#));

        let all = calendar_query(None);
        assert!(!all.contains("time-range"));
        assert!(Document::parse(&all).is_ok());
    }

    #[test]
    fn test_mkcalendar_escapes_name() {
        let body = mkcalendar("A <b> & c");
        let doc = Document::parse(&body).unwrap();
        assert_eq!(text_of(doc.root_element(), "displayname").as_deref(), Some("A <b> & c"));
    }
}
