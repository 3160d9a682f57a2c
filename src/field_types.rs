//! Field-type registry for the enriched event format.
//!
//! Every fixed column of an enriched event has a declared kind. The table is
//! built once per process and only ever read afterwards, so it can be shared
//! freely between extractors running on different input splits.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Kind of a fixed enriched-event field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Bool,
    Int32,
    Double,
    DateTime,
    String,
    Sequence,
    Map,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Bool => "Bool",
            FieldKind::Int32 => "Int32",
            FieldKind::Double => "Double",
            FieldKind::DateTime => "DateTime",
            FieldKind::String => "String",
            FieldKind::Sequence => "Sequence",
            FieldKind::Map => "Map",
        };
        f.write_str(name)
    }
}

use FieldKind::{Bool, DateTime, Double, Int32, Map, Sequence, String};

/// The tab-separated columns of an enriched event, in wire order.
pub const ENRICHED_EVENT_FIELDS: [(&str, FieldKind); 131] = [
    ("app_id", String),
    ("platform", String),
    ("etl_tstamp", DateTime),
    ("collector_tstamp", DateTime),
    ("dvce_created_tstamp", DateTime),
    ("event", String),
    ("event_id", String),
    ("txn_id", Int32),
    ("name_tracker", String),
    ("v_tracker", String),
    ("v_collector", String),
    ("v_etl", String),
    ("user_id", String),
    ("user_ipaddress", String),
    ("user_fingerprint", String),
    ("domain_userid", String),
    ("domain_sessionidx", Int32),
    ("network_userid", String),
    ("geo_country", String),
    ("geo_region", String),
    ("geo_city", String),
    ("geo_zipcode", String),
    ("geo_latitude", Double),
    ("geo_longitude", Double),
    ("geo_region_name", String),
    ("ip_isp", String),
    ("ip_organization", String),
    ("ip_domain", String),
    ("ip_netspeed", String),
    ("page_url", String),
    ("page_title", String),
    ("page_referrer", String),
    ("page_urlscheme", String),
    ("page_urlhost", String),
    ("page_urlport", Int32),
    ("page_urlpath", String),
    ("page_urlquery", String),
    ("page_urlfragment", String),
    ("refr_urlscheme", String),
    ("refr_urlhost", String),
    ("refr_urlport", Int32),
    ("refr_urlpath", String),
    ("refr_urlquery", String),
    ("refr_urlfragment", String),
    ("refr_medium", String),
    ("refr_source", String),
    ("refr_term", String),
    ("mkt_medium", String),
    ("mkt_source", String),
    ("mkt_term", String),
    ("mkt_content", String),
    ("mkt_campaign", String),
    ("contexts", Sequence),
    ("se_category", String),
    ("se_action", String),
    ("se_label", String),
    ("se_property", String),
    ("se_value", String),
    ("unstruct_event", Map),
    ("tr_orderid", String),
    ("tr_affiliation", String),
    ("tr_total", Double),
    ("tr_tax", Double),
    ("tr_shipping", Double),
    ("tr_city", String),
    ("tr_state", String),
    ("tr_country", String),
    ("ti_orderid", String),
    ("ti_sku", String),
    ("ti_name", String),
    ("ti_category", String),
    ("ti_price", Double),
    ("ti_quantity", Int32),
    ("pp_xoffset_min", Int32),
    ("pp_xoffset_max", Int32),
    ("pp_yoffset_min", Int32),
    ("pp_yoffset_max", Int32),
    ("useragent", String),
    ("br_name", String),
    ("br_family", String),
    ("br_version", String),
    ("br_type", String),
    ("br_renderengine", String),
    ("br_lang", String),
    ("br_features_pdf", Bool),
    ("br_features_flash", Bool),
    ("br_features_java", Bool),
    ("br_features_director", Bool),
    ("br_features_quicktime", Bool),
    ("br_features_realplayer", Bool),
    ("br_features_windowsmedia", Bool),
    ("br_features_gears", Bool),
    ("br_features_silverlight", Bool),
    ("br_cookies", Bool),
    ("br_colordepth", String),
    ("br_viewwidth", Int32),
    ("br_viewheight", Int32),
    ("os_name", String),
    ("os_family", String),
    ("os_manufacturer", String),
    ("os_timezone", String),
    ("dvce_type", String),
    ("dvce_ismobile", Bool),
    ("dvce_screenwidth", Int32),
    ("dvce_screenheight", Int32),
    ("doc_charset", String),
    ("doc_width", Int32),
    ("doc_height", Int32),
    ("tr_currency", String),
    ("tr_total_base", Double),
    ("tr_tax_base", Double),
    ("tr_shipping_base", Double),
    ("ti_currency", String),
    ("ti_price_base", Double),
    ("base_currency", String),
    ("geo_timezone", String),
    ("mkt_clickid", String),
    ("mkt_network", String),
    ("etl_tags", String),
    ("dvce_sent_tstamp", DateTime),
    ("refr_domain_userid", String),
    ("refr_device_tstamp", DateTime),
    ("derived_contexts", Sequence),
    ("domain_sessionid", String),
    ("derived_tstamp", DateTime),
    ("event_vendor", String),
    ("event_name", String),
    ("event_format", String),
    ("event_version", String),
    ("event_fingerprint", String),
    ("true_tstamp", DateTime),
];

/// Derived from `geo_latitude` and `geo_longitude`; never present on the wire.
pub const GEO_LOCATION: &str = "geo_location";

static FIELD_TYPES: LazyLock<HashMap<&'static str, FieldKind>> = LazyLock::new(|| {
    let mut types: HashMap<&'static str, FieldKind> =
        ENRICHED_EVENT_FIELDS.iter().copied().collect();
    types.insert(GEO_LOCATION, String);
    types
});

/// Look up the declared kind of a fixed field.
///
/// Returns `None` for anything outside the fixed set; such names are
/// handled by the dynamic column rule in [`crate::schema`].
pub fn lookup(name: &str) -> Option<FieldKind> {
    FIELD_TYPES.get(name).copied()
}

pub fn is_fixed_field(name: &str) -> bool {
    FIELD_TYPES.contains_key(name)
}

/// All registered fields: wire order first, then `geo_location`.
pub fn fields() -> impl Iterator<Item = (&'static str, FieldKind)> {
    ENRICHED_EVENT_FIELDS
        .iter()
        .copied()
        .chain(std::iter::once((GEO_LOCATION, String)))
}
