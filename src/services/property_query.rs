// src/services/property_query.rs
// DOCUMENTATION: Query-string grammar for GET /properties
// PURPOSE: Turn `price[gte]=100000&sort=-price&page=2` style parameters into
// typed filters, then into parameterised SQL
//
// Grammar:
//   field=value | field[op]=value      op: eq ne gt gte lt lte in
//   q=text                             substring over title/description/address/city
//   lat=&lng=&radius_km=               great-circle distance filter
//   sort=-price,created_at             '-' means descending
//   page=, limit=, select=a,b

use crate::errors::AppError;
use crate::models::{ListingStatus, Page, PropertyType};
use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

const RESERVED_KEYS: &[&str] = &["select", "sort", "page", "limit", "q", "lat", "lng", "radius_km"];
const MAX_RADIUS_KM: f64 = 500.0;
const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl FilterOp {
    fn parse(op: &str) -> Result<Self, AppError> {
        match op {
            "eq" => Ok(FilterOp::Eq),
            "ne" => Ok(FilterOp::Ne),
            "gt" => Ok(FilterOp::Gt),
            "gte" => Ok(FilterOp::Gte),
            "lt" => Ok(FilterOp::Lt),
            "lte" => Ok(FilterOp::Lte),
            "in" => Ok(FilterOp::In),
            other => Err(AppError::InvalidInput(format!(
                "Unknown filter operator '{}'",
                other
            ))),
        }
    }

    fn is_range(&self) -> bool {
        matches!(self, FilterOp::Gt | FilterOp::Gte | FilterOp::Lt | FilterOp::Lte)
    }

    fn sql(&self) -> &'static str {
        match self {
            FilterOp::Eq | FilterOp::In => " = ",
            FilterOp::Ne => " <> ",
            FilterOp::Gt => " > ",
            FilterOp::Gte => " >= ",
            FilterOp::Lt => " < ",
            FilterOp::Lte => " <= ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Number,
    /// Exact text match
    Text,
    /// Case-insensitive text match
    FoldedText,
    PropertyType,
    ListingStatus,
    Uuid,
    Bool,
    List,
}

/// Filterable listing fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Price,
    Bedrooms,
    Bathrooms,
    AreaSqft,
    YearBuilt,
    Views,
    PropertyType,
    ListingStatus,
    City,
    State,
    ZipCode,
    Country,
    Agent,
    IsFeatured,
    Amenities,
}

impl FilterField {
    fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "price" => FilterField::Price,
            "bedrooms" => FilterField::Bedrooms,
            "bathrooms" => FilterField::Bathrooms,
            "area_sqft" => FilterField::AreaSqft,
            "year_built" => FilterField::YearBuilt,
            "views" => FilterField::Views,
            "property_type" => FilterField::PropertyType,
            "listing_status" => FilterField::ListingStatus,
            "city" => FilterField::City,
            "state" => FilterField::State,
            "zip_code" => FilterField::ZipCode,
            "country" => FilterField::Country,
            "agent" => FilterField::Agent,
            "is_featured" => FilterField::IsFeatured,
            "amenities" => FilterField::Amenities,
            _ => return None,
        })
    }

    fn column(&self) -> &'static str {
        match self {
            FilterField::Price => "p.price",
            FilterField::Bedrooms => "p.bedrooms",
            FilterField::Bathrooms => "p.bathrooms",
            FilterField::AreaSqft => "p.area_sqft",
            FilterField::YearBuilt => "p.year_built",
            FilterField::Views => "p.views",
            FilterField::PropertyType => "p.property_type",
            FilterField::ListingStatus => "p.listing_status",
            FilterField::City => "LOWER(p.city)",
            FilterField::State => "LOWER(p.state)",
            FilterField::ZipCode => "p.zip_code",
            FilterField::Country => "LOWER(p.country)",
            FilterField::Agent => "p.agent_id",
            FilterField::IsFeatured => "p.is_featured",
            FilterField::Amenities => "p.amenities",
        }
    }

    fn kind(&self) -> FieldKind {
        match self {
            FilterField::Price
            | FilterField::Bedrooms
            | FilterField::Bathrooms
            | FilterField::AreaSqft
            | FilterField::YearBuilt
            | FilterField::Views => FieldKind::Number,
            FilterField::PropertyType => FieldKind::PropertyType,
            FilterField::ListingStatus => FieldKind::ListingStatus,
            FilterField::City | FilterField::State | FilterField::Country => FieldKind::FoldedText,
            FilterField::ZipCode => FieldKind::Text,
            FilterField::Agent => FieldKind::Uuid,
            FilterField::IsFeatured => FieldKind::Bool,
            FilterField::Amenities => FieldKind::List,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Number(f64),
    Numbers(Vec<f64>),
    Text(String),
    Texts(Vec<String>),
    Uuid(Uuid),
    Uuids(Vec<Uuid>),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: FilterField,
    pub op: FilterOp,
    pub value: FilterValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Price,
    CreatedAt,
    UpdatedAt,
    Bedrooms,
    Bathrooms,
    AreaSqft,
    YearBuilt,
    Views,
    Title,
}

impl SortField {
    fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "price" => SortField::Price,
            "created_at" => SortField::CreatedAt,
            "updated_at" => SortField::UpdatedAt,
            "bedrooms" => SortField::Bedrooms,
            "bathrooms" => SortField::Bathrooms,
            "area_sqft" => SortField::AreaSqft,
            "year_built" => SortField::YearBuilt,
            "views" => SortField::Views,
            "title" => SortField::Title,
            _ => return None,
        })
    }

    fn column(&self) -> &'static str {
        match self {
            SortField::Price => "p.price",
            SortField::CreatedAt => "p.created_at",
            SortField::UpdatedAt => "p.updated_at",
            SortField::Bedrooms => "p.bedrooms",
            SortField::Bathrooms => "p.bathrooms",
            SortField::AreaSqft => "p.area_sqft",
            SortField::YearBuilt => "p.year_built",
            SortField::Views => "p.views",
            SortField::Title => "p.title",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearFilter {
    pub lat: f64,
    pub lng: f64,
    pub radius_km: f64,
}

/// Parsed GET /properties query
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyQuery {
    pub filters: Vec<Filter>,
    pub search: Option<String>,
    pub near: Option<NearFilter>,
    pub sort: Vec<SortKey>,
    pub page: Page,
    pub select: Option<Vec<String>>,
}

impl Default for PropertyQuery {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            search: None,
            near: None,
            sort: default_sort(),
            page: Page::default(),
            select: None,
        }
    }
}

fn default_sort() -> Vec<SortKey> {
    vec![SortKey {
        field: SortField::CreatedAt,
        descending: true,
    }]
}

/// Split `price[gte]` into ("price", Some("gte"))
fn split_key(key: &str) -> Result<(&str, Option<&str>), AppError> {
    match key.find('[') {
        None => Ok((key, None)),
        Some(open) => {
            let rest = &key[open + 1..];
            let op = rest.strip_suffix(']').ok_or_else(|| {
                AppError::InvalidInput(format!("Malformed filter key '{}'", key))
            })?;
            Ok((&key[..open], Some(op)))
        }
    }
}

fn parse_number(field: &str, raw: &str) -> Result<f64, AppError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::InvalidInput(format!("'{}' expects a number, got '{}'", field, raw)))
}

fn parse_bool(field: &str, raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(AppError::InvalidInput(format!(
            "'{}' expects true or false, got '{}'",
            field, raw
        ))),
    }
}

fn parse_uuid(field: &str, raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::InvalidInput(format!("'{}' expects an id, got '{}'", field, raw)))
}

fn split_list(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_text(kind: FieldKind, field: &str, raw: &str) -> Result<String, AppError> {
    let value = raw.trim();
    match kind {
        FieldKind::PropertyType => value
            .parse::<PropertyType>()
            .map(|v| v.as_str().to_string())
            .map_err(|e| AppError::InvalidInput(format!("'{}': {}", field, e))),
        FieldKind::ListingStatus => value
            .parse::<ListingStatus>()
            .map(|v| v.as_str().to_string())
            .map_err(|e| AppError::InvalidInput(format!("'{}': {}", field, e))),
        FieldKind::FoldedText => Ok(value.to_lowercase()),
        _ => Ok(value.to_string()),
    }
}

fn parse_filter(key: &str, raw: &str) -> Result<Filter, AppError> {
    let (name, op) = split_key(key)?;
    let field = FilterField::from_key(name)
        .ok_or_else(|| AppError::InvalidInput(format!("Cannot filter on '{}'", name)))?;
    let op = match op {
        Some(op) => FilterOp::parse(op)?,
        None => FilterOp::Eq,
    };
    let kind = field.kind();

    if op.is_range() && kind != FieldKind::Number {
        return Err(AppError::InvalidInput(format!(
            "Range operators are not supported on '{}'",
            name
        )));
    }

    let value = match (kind, op) {
        (FieldKind::Number, FilterOp::In) => FilterValue::Numbers(
            split_list(raw)
                .into_iter()
                .map(|v| parse_number(name, v))
                .collect::<Result<_, _>>()?,
        ),
        (FieldKind::Number, _) => FilterValue::Number(parse_number(name, raw)?),
        (FieldKind::Uuid, FilterOp::In) => FilterValue::Uuids(
            split_list(raw)
                .into_iter()
                .map(|v| parse_uuid(name, v))
                .collect::<Result<_, _>>()?,
        ),
        (FieldKind::Uuid, _) => FilterValue::Uuid(parse_uuid(name, raw)?),
        (FieldKind::Bool, FilterOp::In) => {
            return Err(AppError::InvalidInput(format!(
                "'in' is not supported on '{}'",
                name
            )))
        }
        (FieldKind::Bool, _) => FilterValue::Bool(parse_bool(name, raw)?),
        (_, FilterOp::In) => FilterValue::Texts(
            split_list(raw)
                .into_iter()
                .map(|v| parse_text(kind, name, v))
                .collect::<Result<_, _>>()?,
        ),
        (_, _) => FilterValue::Text(parse_text(kind, name, raw)?),
    };

    if matches!(&value, FilterValue::Numbers(v) if v.is_empty())
        || matches!(&value, FilterValue::Uuids(v) if v.is_empty())
        || matches!(&value, FilterValue::Texts(v) if v.is_empty())
    {
        return Err(AppError::InvalidInput(format!(
            "'{}[in]' needs at least one value",
            name
        )));
    }

    Ok(Filter { field, op, value })
}

fn parse_sort(raw: &str) -> Result<Vec<SortKey>, AppError> {
    let mut keys = Vec::new();
    for part in split_list(raw) {
        let (descending, name) = match part.strip_prefix('-') {
            Some(name) => (true, name),
            None => (false, part.strip_prefix('+').unwrap_or(part)),
        };
        let field = SortField::from_key(name)
            .ok_or_else(|| AppError::InvalidInput(format!("Cannot sort by '{}'", name)))?;
        keys.push(SortKey { field, descending });
    }

    if keys.is_empty() {
        Ok(default_sort())
    } else {
        Ok(keys)
    }
}

fn parse_page_number(key: &str, raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::InvalidInput(format!("'{}' must be an integer", key)))
}

/// Escape LIKE wildcards in user text
fn like_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

impl PropertyQuery {
    /// Parse raw query pairs in order of appearance
    pub fn parse(pairs: &[(String, String)]) -> Result<Self, AppError> {
        let mut query = PropertyQuery::default();
        let mut page = None;
        let mut limit = None;
        let mut lat = None;
        let mut lng = None;
        let mut radius_km = None;

        for (key, raw) in pairs {
            let key = key.trim();
            if RESERVED_KEYS.contains(&key) {
                match key {
                    "select" => {
                        let fields: Vec<String> =
                            split_list(raw).into_iter().map(str::to_string).collect();
                        query.select = if fields.is_empty() { None } else { Some(fields) };
                    }
                    "sort" => query.sort = parse_sort(raw)?,
                    "page" => page = Some(parse_page_number(key, raw)?),
                    "limit" => limit = Some(parse_page_number(key, raw)?),
                    "q" => {
                        let text = raw.trim();
                        query.search = if text.is_empty() {
                            None
                        } else {
                            Some(text.to_string())
                        };
                    }
                    "lat" => lat = Some(parse_number(key, raw)?),
                    "lng" => lng = Some(parse_number(key, raw)?),
                    "radius_km" => radius_km = Some(parse_number(key, raw)?),
                    _ => {}
                }
                continue;
            }

            query.filters.push(parse_filter(key, raw)?);
        }

        query.page = Page::new(page, limit);
        query.near = match (lat, lng, radius_km) {
            (None, None, None) => None,
            (Some(lat), Some(lng), Some(radius_km)) => {
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
                    return Err(AppError::InvalidInput(
                        "lat/lng are out of range".to_string(),
                    ));
                }
                if radius_km <= 0.0 || radius_km > MAX_RADIUS_KM {
                    return Err(AppError::InvalidInput(format!(
                        "radius_km must be in (0, {}]",
                        MAX_RADIUS_KM
                    )));
                }
                Some(NearFilter { lat, lng, radius_km })
            }
            _ => {
                return Err(AppError::InvalidInput(
                    "lat, lng and radius_km must be given together".to_string(),
                ))
            }
        };

        Ok(query)
    }

    /// Append ` AND <condition>` for every filter
    /// The caller has already pushed a WHERE clause
    pub fn push_conditions(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        for filter in &self.filters {
            qb.push(" AND ");
            push_filter(qb, filter);
        }

        if let Some(text) = &self.search {
            let pattern = like_pattern(text);
            qb.push(" AND (p.title ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR p.description ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR p.address ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR p.city ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }

        if let Some(near) = &self.near {
            qb.push(" AND p.latitude IS NOT NULL AND p.longitude IS NOT NULL AND (");
            qb.push(EARTH_RADIUS_KM.to_string());
            qb.push(" * 2 * ASIN(SQRT(POWER(SIN(RADIANS(p.latitude - ");
            qb.push_bind(near.lat);
            qb.push(") / 2), 2) + COS(RADIANS(");
            qb.push_bind(near.lat);
            qb.push(")) * COS(RADIANS(p.latitude)) * POWER(SIN(RADIANS(p.longitude - ");
            qb.push_bind(near.lng);
            qb.push(") / 2), 2)))) <= ");
            qb.push_bind(near.radius_km);
        }
    }

    /// `ORDER BY ...` built from whitelisted columns only
    pub fn order_by_clause(&self) -> String {
        let mut parts: Vec<String> = self
            .sort
            .iter()
            .map(|key| {
                format!(
                    "{} {} NULLS LAST",
                    key.field.column(),
                    if key.descending { "DESC" } else { "ASC" }
                )
            })
            .collect();
        parts.push("p.id ASC".to_string());
        format!(" ORDER BY {}", parts.join(", "))
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    let column = filter.field.column();

    match (&filter.value, filter.field.kind()) {
        (FilterValue::Text(value), FieldKind::List) => {
            if filter.op == FilterOp::Ne {
                qb.push("NOT (");
                qb.push_bind(value.clone());
                qb.push(" = ANY(p.amenities))");
            } else {
                qb.push_bind(value.clone());
                qb.push(" = ANY(p.amenities)");
            }
        }
        (FilterValue::Texts(values), FieldKind::List) => {
            qb.push("p.amenities && ");
            qb.push_bind(values.clone());
        }
        (FilterValue::Number(value), _) => {
            qb.push(column);
            qb.push(filter.op.sql());
            qb.push_bind(*value);
        }
        (FilterValue::Numbers(values), _) => {
            qb.push(column);
            qb.push(" = ANY(");
            qb.push_bind(values.clone());
            qb.push(")");
        }
        (FilterValue::Text(value), _) => {
            qb.push(column);
            qb.push(filter.op.sql());
            qb.push_bind(value.clone());
        }
        (FilterValue::Texts(values), _) => {
            qb.push(column);
            qb.push(" = ANY(");
            qb.push_bind(values.clone());
            qb.push(")");
        }
        (FilterValue::Uuid(value), _) => {
            qb.push(column);
            qb.push(filter.op.sql());
            qb.push_bind(*value);
        }
        (FilterValue::Uuids(values), _) => {
            qb.push(column);
            qb.push(" = ANY(");
            qb.push_bind(values.clone());
            qb.push(")");
        }
        (FilterValue::Bool(value), _) => {
            qb.push(column);
            qb.push(filter.op.sql());
            qb.push_bind(*value);
        }
    }
}

/// Keep only the selected top-level fields of a serialized object
/// `id` is always kept; unknown names are ignored
pub fn project(value: Value, select: &[String]) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| key == "id" || select.iter().any(|s| s == key))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn sql_for(query: &PropertyQuery) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM properties p WHERE p.is_active = true");
        query.push_conditions(&mut qb);
        qb.push(query.order_by_clause());
        qb.sql().to_string()
    }

    #[test]
    fn test_defaults() {
        let query = PropertyQuery::parse(&[]).unwrap();
        assert!(query.filters.is_empty());
        assert_eq!(query.page, Page { page: 1, limit: 10 });
        assert_eq!(query.sort, default_sort());
        assert!(query.select.is_none());
    }

    #[test]
    fn test_range_operators() {
        let query = PropertyQuery::parse(&pairs(&[
            ("price[gte]", "100000"),
            ("price[lt]", "500000"),
            ("bedrooms", "3"),
        ]))
        .unwrap();

        assert_eq!(
            query.filters,
            vec![
                Filter {
                    field: FilterField::Price,
                    op: FilterOp::Gte,
                    value: FilterValue::Number(100000.0)
                },
                Filter {
                    field: FilterField::Price,
                    op: FilterOp::Lt,
                    value: FilterValue::Number(500000.0)
                },
                Filter {
                    field: FilterField::Bedrooms,
                    op: FilterOp::Eq,
                    value: FilterValue::Number(3.0)
                },
            ]
        );

        let sql = sql_for(&query);
        assert!(sql.contains("p.price >= $1"));
        assert!(sql.contains("p.price < $2"));
        assert!(sql.contains("p.bedrooms = $3"));
    }

    #[test]
    fn test_in_lists_and_enum_validation() {
        let query = PropertyQuery::parse(&pairs(&[(
            "property_type[in]",
            "house, condo",
        )]))
        .unwrap();
        assert_eq!(
            query.filters[0].value,
            FilterValue::Texts(vec!["house".to_string(), "condo".to_string()])
        );
        assert!(sql_for(&query).contains("p.property_type = ANY($1)"));

        let err = PropertyQuery::parse(&pairs(&[("property_type", "castle")])).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_city_match_is_case_insensitive() {
        let query = PropertyQuery::parse(&pairs(&[("city", "Springfield")])).unwrap();
        assert_eq!(
            query.filters[0].value,
            FilterValue::Text("springfield".to_string())
        );
        assert!(sql_for(&query).contains("LOWER(p.city) = $1"));
    }

    #[test]
    fn test_amenities_filters() {
        let contains = PropertyQuery::parse(&pairs(&[("amenities", "pool")])).unwrap();
        assert!(sql_for(&contains).contains("$1 = ANY(p.amenities)"));

        let overlaps = PropertyQuery::parse(&pairs(&[("amenities[in]", "pool,garage")])).unwrap();
        assert!(sql_for(&overlaps).contains("p.amenities && $1"));

        let excluded = PropertyQuery::parse(&pairs(&[("amenities[ne]", "pool")])).unwrap();
        assert!(sql_for(&excluded).contains("NOT ($1 = ANY(p.amenities))"));
    }

    #[test]
    fn test_rejections() {
        let bad = [
            ("password", "x"),
            ("price[between]", "1"),
            ("price", "cheap"),
            ("city[gte]", "a"),
            ("agent", "not-a-uuid"),
            ("is_featured", "maybe"),
            ("is_featured[in]", "true"),
            ("price[gte", "1"),
            ("bedrooms[in]", " , "),
        ];
        for (key, value) in bad {
            let result = PropertyQuery::parse(&pairs(&[(key, value)]));
            assert!(result.is_err(), "{}={} should be rejected", key, value);
        }
    }

    #[test]
    fn test_sort_parsing() {
        let query = PropertyQuery::parse(&pairs(&[("sort", "-price,title")])).unwrap();
        assert_eq!(
            query.sort,
            vec![
                SortKey {
                    field: SortField::Price,
                    descending: true
                },
                SortKey {
                    field: SortField::Title,
                    descending: false
                },
            ]
        );
        assert_eq!(
            query.order_by_clause(),
            " ORDER BY p.price DESC NULLS LAST, p.title ASC NULLS LAST, p.id ASC"
        );

        assert!(PropertyQuery::parse(&pairs(&[("sort", "password")])).is_err());
        // Empty sort falls back to newest first
        let empty = PropertyQuery::parse(&pairs(&[("sort", "")])).unwrap();
        assert_eq!(empty.sort, default_sort());
    }

    #[test]
    fn test_pagination_is_clamped() {
        let query = PropertyQuery::parse(&pairs(&[("page", "0"), ("limit", "1000")])).unwrap();
        assert_eq!(query.page, Page { page: 1, limit: 100 });

        assert!(PropertyQuery::parse(&pairs(&[("page", "two")])).is_err());

        let huge = PropertyQuery::parse(&pairs(&[("page", "9223372036854775807")])).unwrap();
        assert_eq!(huge.page.page, crate::models::MAX_PAGE);
        assert!(huge.page.offset() >= 0);
    }

    #[test]
    fn test_search_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");

        let query = PropertyQuery::parse(&pairs(&[("q", "  lake view ")])).unwrap();
        assert_eq!(query.search.as_deref(), Some("lake view"));
        let sql = sql_for(&query);
        assert!(sql.contains("p.title ILIKE $1"));
        assert!(sql.contains("p.city ILIKE $4"));
    }

    #[test]
    fn test_near_requires_all_parts() {
        let query = PropertyQuery::parse(&pairs(&[
            ("lat", "39.78"),
            ("lng", "-89.65"),
            ("radius_km", "10"),
        ]))
        .unwrap();
        assert_eq!(
            query.near,
            Some(NearFilter {
                lat: 39.78,
                lng: -89.65,
                radius_km: 10.0
            })
        );
        let sql = sql_for(&query);
        assert!(sql.contains("p.latitude IS NOT NULL"));
        assert!(sql.contains("<= $4"));

        assert!(PropertyQuery::parse(&pairs(&[("lat", "39.78")])).is_err());
        assert!(PropertyQuery::parse(&pairs(&[
            ("lat", "39.78"),
            ("lng", "-89.65"),
            ("radius_km", "0")
        ]))
        .is_err());
        assert!(PropertyQuery::parse(&pairs(&[
            ("lat", "95"),
            ("lng", "0"),
            ("radius_km", "5")
        ]))
        .is_err());
    }

    #[test]
    fn test_values_are_bound_not_inlined() {
        let query = PropertyQuery::parse(&pairs(&[("zip_code", "1'; DROP TABLE users;--")])).unwrap();
        let sql = sql_for(&query);
        assert!(!sql.contains("DROP TABLE"));
        assert!(sql.contains("p.zip_code = $1"));
    }

    #[test]
    fn test_projection_keeps_id() {
        let value = serde_json::json!({
            "id": "abc",
            "title": "House",
            "price": 1.0,
            "city": "Springfield"
        });
        let projected = project(value, &["price".to_string(), "bogus".to_string()]);
        assert_eq!(projected, serde_json::json!({ "id": "abc", "price": 1.0 }));
    }

    #[test]
    fn test_select_parsing() {
        let query = PropertyQuery::parse(&pairs(&[("select", "title, price")])).unwrap();
        assert_eq!(
            query.select,
            Some(vec!["title".to_string(), "price".to_string()])
        );
    }
}
