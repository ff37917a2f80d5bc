// =============================================================================
// Declaration - contracts read from JSON or YAML
// =============================================================================
//
// A declaration is a mapping from parameter name to constraint object. The
// reserved key "return" constrains the result:
//
//   img:    { type: ndarray, dtype: u8,  shape: [1, 3, H, W], range: [0, 255] }
//   mask:   { type: ndarray, dtype: f64, shape: [1, 1, H, W], range: [0, 1] }
//   return: { shape: [1, 1, H, W] }
//
// Everything is converted to a typed AnnotationSpec once, here. Nothing in
// the validators ever looks at JSON.
//
// Constraint fields are a closed set (type, dtype, shape, range); any other
// key is rejected so that a typo does not silently drop a check. Mapping
// order is kept (serde_json's preserve_order), because the first parameter
// to mention a symbol is the one that binds it.
//
// JSON has no literal for infinity, so a range bound may also be written as
// a string: "inf", "-inf" or the YAML spellings ".inf", "-.inf". YAML's own
// non-finite floats are carried over in that form when the YAML tree is
// converted.

use std::path::Path;

use serde_json::{Map, Value as Json};
use serde_yaml::Value as Yaml;

use tensorcheck_core::{
    AnnotationSpec, ConstraintSet, ElementType, Error, Family, Result, SymDim, SymbolicShape,
};

/// Build an [`AnnotationSpec`] from an already-parsed JSON value.
pub fn from_value(value: &Json) -> Result<AnnotationSpec> {
    let Json::Object(entries) = value else {
        return Err(Error::msg(format!(
            "contract declaration must map parameter names to constraints, got {value}"
        )));
    };
    let mut parsed = Vec::with_capacity(entries.len());
    for (name, decl) in entries {
        parsed.push((name.clone(), parse_constraints(name, decl)?));
    }
    let spec = AnnotationSpec::new(parsed)?;
    log::debug!(
        "loaded contract: {} argument(s), return {}",
        spec.arguments().count(),
        if spec.return_constraint().is_some() { "constrained" } else { "unconstrained" }
    );
    Ok(spec)
}

/// Parse a JSON declaration.
pub fn from_json_str(s: &str) -> Result<AnnotationSpec> {
    let value: Json = serde_json::from_str(s).map_err(|e| Error::Declaration(e.to_string()))?;
    from_value(&value)
}

/// Parse a YAML declaration.
pub fn from_yaml_str(s: &str) -> Result<AnnotationSpec> {
    let value: Yaml = serde_yaml::from_str(s).map_err(|e| Error::Declaration(e.to_string()))?;
    from_value(&yaml_to_json(value)?)
}

/// Read a declaration file. `.json` files are parsed as JSON, anything else
/// as YAML.
pub fn from_path(path: impl AsRef<Path>) -> Result<AnnotationSpec> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        from_json_str(&content)
    } else {
        from_yaml_str(&content)
    }
}

// serde_json numbers cannot hold inf or NaN; those become their YAML spelling.
fn yaml_to_json(value: Yaml) -> Result<Json> {
    Ok(match value {
        Yaml::Null => Json::Null,
        Yaml::Bool(b) => Json::Bool(b),
        Yaml::Number(n) => {
            if let Some(u) = n.as_u64() {
                Json::from(u)
            } else if let Some(i) = n.as_i64() {
                Json::from(i)
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                match serde_json::Number::from_f64(f) {
                    Some(n) => Json::Number(n),
                    None if f.is_nan() => Json::from(".nan"),
                    None if f > 0.0 => Json::from(".inf"),
                    None => Json::from("-.inf"),
                }
            }
        }
        Yaml::String(s) => Json::String(s),
        Yaml::Sequence(items) => Json::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<Result<Vec<_>>>()?,
        ),
        Yaml::Mapping(entries) => {
            let mut map = Map::with_capacity(entries.len());
            for (key, v) in entries {
                let Yaml::String(key) = key else {
                    return Err(Error::Declaration(format!(
                        "mapping keys must be strings, got {key:?}"
                    )));
                };
                map.insert(key, yaml_to_json(v)?);
            }
            Json::Object(map)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-field parsing
// ─────────────────────────────────────────────────────────────────────────────

fn parse_constraints(name: &str, decl: &Json) -> Result<ConstraintSet> {
    let Json::Object(fields) = decl else {
        return Err(Error::msg(format!(
            "constraints for {name} must be a mapping, got {decl}"
        )));
    };
    reject_unknown_fields(name, fields)?;

    let mut set = ConstraintSet::new();
    if let Some(v) = fields.get("type") {
        set = set.family(parse_str(name, "type", v)?.parse::<Family>()?);
    }
    if let Some(v) = fields.get("dtype") {
        set = set.dtype(parse_str(name, "dtype", v)?.parse::<ElementType>()?);
    }
    if let Some(v) = fields.get("shape") {
        set = set.shape(parse_shape(v)?);
    }
    if let Some(v) = fields.get("range") {
        let (min, max) = parse_range(name, v)?;
        set = set.range(min, max);
    }
    Ok(set)
}

const FIELDS: [&str; 4] = ["type", "dtype", "shape", "range"];

fn reject_unknown_fields(name: &str, fields: &Map<String, Json>) -> Result<()> {
    for key in fields.keys() {
        if !FIELDS.contains(&key.as_str()) {
            return Err(Error::msg(format!(
                "{key} is not a known constraint for {name} (expected one of {})",
                FIELDS.join(", ")
            )));
        }
    }
    Ok(())
}

fn parse_str<'v>(name: &str, field: &str, v: &'v Json) -> Result<&'v str> {
    v.as_str()
        .ok_or_else(|| Error::msg(format!("{field} of {name} must be a string, got {v}")))
}

/// A shape is a list whose elements are sizes or symbolic names.
///
/// Floats are accepted when they hold a non-negative whole number.
pub fn parse_shape(v: &Json) -> Result<SymbolicShape> {
    let Json::Array(elements) = v else {
        return Err(Error::InvalidShapeAnnotation {
            value: v.to_string(),
        });
    };
    elements
        .iter()
        .map(parse_dim)
        .collect::<Result<Vec<_>>>()
        .map(SymbolicShape::new)
}

fn parse_dim(v: &Json) -> Result<SymDim> {
    let invalid = || Error::InvalidShapeElement {
        element: v.to_string(),
    };
    match v {
        Json::String(s) if non_finite(s).is_some() => Err(Error::InvalidShapeElement {
            element: s.clone(),
        }),
        Json::String(s) => Ok(SymDim::symbolic(s.as_str())),
        Json::Number(n) => {
            if let Some(u) = n.as_u64() {
                return usize::try_from(u).map(SymDim::fixed).map_err(|_| invalid());
            }
            match n.as_f64() {
                Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= usize::MAX as f64 => {
                    Ok(SymDim::fixed(f as usize))
                }
                _ => Err(invalid()),
            }
        }
        _ => Err(invalid()),
    }
}

fn parse_range(name: &str, v: &Json) -> Result<(f64, f64)> {
    let bounds = v.as_array().filter(|b| b.len() == 2);
    match bounds.map(|b| (parse_bound(&b[0]), parse_bound(&b[1]))) {
        Some((Some(min), Some(max))) => Ok((min, max)),
        _ => Err(Error::msg(format!(
            "range of {name} must be a list of two numbers, got {v}"
        ))),
    }
}

fn parse_bound(v: &Json) -> Option<f64> {
    match v {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => non_finite(s),
        _ => None,
    }
}

/// `inf`, `-inf`, `.inf`, `-.inf`, `infinity` (any case), and `nan`/`.nan`.
fn non_finite(s: &str) -> Option<f64> {
    let (sign, rest) = match s.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, s.strip_prefix('+').unwrap_or(s)),
    };
    let rest = rest.strip_prefix('.').unwrap_or(rest);
    if rest.eq_ignore_ascii_case("inf") || rest.eq_ignore_ascii_case("infinity") {
        Some(sign * f64::INFINITY)
    } else if rest.eq_ignore_ascii_case("nan") {
        Some(f64::NAN)
    } else {
        None
    }
}
