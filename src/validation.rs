//! Boundary checks for outgoing drafts. A draft that fails here never reaches
//! the network; the first offending field is reported.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::api::models::{FactionUpdate, GeometryUpdate, NewFaction, NewGeometry, NewUser, UserUpdate};
use crate::error::{AdminError, AdminResult};

static COLOR_HEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("color regex"));
static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"));

pub const ACRONYM_MAX: usize = 10;
pub const PRIORITY_RANGE: std::ops::RangeInclusive<i32> = 1..=100;
pub const PASSWORD_MIN: usize = 6;

pub trait Validate {
    fn validate(&self) -> AdminResult<()>;
}

fn required(field: &str, v: &str) -> AdminResult<()> {
    if v.trim().is_empty() {
        return Err(AdminError::validation(field, "must not be empty"));
    }
    Ok(())
}

fn acronym(v: &str) -> AdminResult<()> {
    required("acronym", v)?;
    if v.chars().count() > ACRONYM_MAX {
        return Err(AdminError::validation("acronym", format!("at most {} characters", ACRONYM_MAX)));
    }
    Ok(())
}

fn color(v: &str) -> AdminResult<()> {
    if !COLOR_HEX.is_match(v) {
        return Err(AdminError::validation("color_hex", "expected #RRGGBB"));
    }
    Ok(())
}

fn priority(v: i32) -> AdminResult<()> {
    if !PRIORITY_RANGE.contains(&v) {
        return Err(AdminError::validation(
            "display_priority",
            format!("must be between {} and {}", PRIORITY_RANGE.start(), PRIORITY_RANGE.end()),
        ));
    }
    Ok(())
}

fn email(v: &str) -> AdminResult<()> {
    if !EMAIL.is_match(v.trim()) {
        return Err(AdminError::validation("email", "not an email address"));
    }
    Ok(())
}

fn password(v: &str) -> AdminResult<()> {
    if v.chars().count() < PASSWORD_MIN {
        return Err(AdminError::validation("password", format!("at least {} characters", PASSWORD_MIN)));
    }
    Ok(())
}

fn geojson(v: &serde_json::Value) -> AdminResult<()> {
    if !v.is_object() {
        return Err(AdminError::validation("geojson", "must be a GeoJSON object"));
    }
    Ok(())
}

fn validity<T: PartialOrd>(start: Option<&T>, end: Option<&T>) -> AdminResult<()> {
    if let (Some(s), Some(e)) = (start, end) {
        if e < s {
            return Err(AdminError::validation("validity_end", "ends before validity_start"));
        }
    }
    Ok(())
}

impl Validate for NewFaction {
    fn validate(&self) -> AdminResult<()> {
        required("name", &self.name)?;
        acronym(&self.acronym)?;
        color(&self.color_hex)?;
        priority(self.display_priority)
    }
}

impl Validate for FactionUpdate {
    fn validate(&self) -> AdminResult<()> {
        if let Some(n) = &self.name { required("name", n)?; }
        if let Some(a) = &self.acronym { acronym(a)?; }
        if let Some(c) = &self.color_hex { color(c)?; }
        if let Some(p) = self.display_priority { priority(p)?; }
        Ok(())
    }
}

impl Validate for NewUser {
    fn validate(&self) -> AdminResult<()> {
        required("name", &self.name)?;
        email(&self.email)?;
        password(&self.password)
    }
}

impl Validate for UserUpdate {
    fn validate(&self) -> AdminResult<()> {
        if let Some(n) = &self.name { required("name", n)?; }
        if let Some(e) = &self.email { email(e)?; }
        if let Some(p) = &self.password { password(p)?; }
        Ok(())
    }
}

impl Validate for NewGeometry {
    fn validate(&self) -> AdminResult<()> {
        required("geometry_type", &self.geometry_type)?;
        geojson(&self.geojson)?;
        validity(self.validity_start.as_ref(), self.validity_end.as_ref())
    }
}

impl Validate for GeometryUpdate {
    fn validate(&self) -> AdminResult<()> {
        if let Some(t) = &self.geometry_type { required("geometry_type", t)?; }
        if let Some(g) = &self.geojson { geojson(g)?; }
        validity(self.validity_start.as_ref(), self.validity_end.as_ref())
    }
}
