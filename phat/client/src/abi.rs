//! ink! contract metadata.
//!
//! Only the parts needed to build calls and recognise events are modelled:
//! message and constructor selectors, mutability, declared return types, the
//! event list and the type registry. Argument and return values stay SCALE
//! bytes; callers pick the Rust type to decode them into. Event data is
//! checked against the registry before it is accepted.

use parity_scale_codec::{Compact, Decode};
use scale_info::{
    form::PortableForm, Field, PortableRegistry, PortableType, TypeDef, TypeDefPrimitive,
};
use serde::{Deserialize, Deserializer};

use crate::{Error, Result};

pub type Selector = [u8; 4];

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeSpec {
    #[serde(rename = "type")]
    pub type_id: u32,
    #[serde(default)]
    pub display_name: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ArgSpec {
    pub label: String,
    #[serde(rename = "type")]
    pub ty: TypeSpec,
    /// Only meaningful for event arguments.
    #[serde(default)]
    pub indexed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSpec {
    pub label: String,
    #[serde(deserialize_with = "deserialize_selector")]
    pub selector: Selector,
    #[serde(default)]
    pub mutates: bool,
    #[serde(default)]
    pub payable: bool,
    #[serde(default)]
    pub args: Vec<ArgSpec>,
    #[serde(default)]
    pub return_type: Option<TypeSpec>,
    #[serde(default)]
    pub docs: Vec<String>,
}

impl MessageSpec {
    /// `selector ++ args`, the call data understood by the contract.
    pub fn encode_call(&self, args: &[u8]) -> Vec<u8> {
        encode_call(&self.selector, args)
    }

    pub fn returns_value(&self) -> bool {
        self.return_type.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ConstructorSpec {
    pub label: String,
    #[serde(deserialize_with = "deserialize_selector")]
    pub selector: Selector,
    #[serde(default)]
    pub payable: bool,
    #[serde(default)]
    pub args: Vec<ArgSpec>,
    #[serde(default)]
    pub docs: Vec<String>,
}

impl ConstructorSpec {
    pub fn encode_call(&self, args: &[u8]) -> Vec<u8> {
        encode_call(&self.selector, args)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct EventSpec {
    pub label: String,
    #[serde(default)]
    pub args: Vec<ArgSpec>,
    #[serde(default)]
    pub docs: Vec<String>,
}

/// A contract event whose argument bytes match the declared argument types;
/// the bytes are kept encoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedEvent {
    pub index: u8,
    pub label: String,
    pub data: Vec<u8>,
}

impl DecodedEvent {
    pub fn decode_args<T: Decode>(&self) -> Result<T> {
        Ok(T::decode(&mut &self.data[..])?)
    }
}

#[derive(Deserialize)]
struct RawMetadata {
    #[serde(default)]
    contract: Option<RawContract>,
    spec: RawSpec,
    #[serde(default)]
    types: Vec<PortableType>,
}

#[derive(Deserialize)]
struct RawContract {
    name: String,
}

#[derive(Deserialize)]
struct RawSpec {
    #[serde(default)]
    constructors: Vec<ConstructorSpec>,
    messages: Vec<MessageSpec>,
    #[serde(default)]
    events: Vec<EventSpec>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractAbi {
    name: Option<String>,
    constructors: Vec<ConstructorSpec>,
    messages: Vec<MessageSpec>,
    events: Vec<EventSpec>,
    types: PortableRegistry,
}

impl ContractAbi {
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawMetadata = serde_json::from_str(text).map_err(|e| Error::Abi(e.to_string()))?;
        if raw.spec.events.len() > usize::from(u8::MAX) + 1 {
            return Err(Error::Abi("more events than a one-byte index can address".into()));
        }
        Ok(Self {
            name: raw.contract.map(|c| c.name),
            constructors: raw.spec.constructors,
            messages: raw.spec.messages,
            events: raw.spec.events,
            types: PortableRegistry { types: raw.types },
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn messages(&self) -> &[MessageSpec] {
        &self.messages
    }

    pub fn constructors(&self) -> &[ConstructorSpec] {
        &self.constructors
    }

    pub fn events(&self) -> &[EventSpec] {
        &self.events
    }

    /// Looks a message up by label or by `0x`-prefixed selector.
    pub fn find_message(&self, name_or_selector: &str) -> Result<&MessageSpec> {
        let selector = parse_selector(name_or_selector).ok();
        self.messages
            .iter()
            .find(|m| m.label == name_or_selector || Some(m.selector) == selector)
            .ok_or_else(|| Error::MessageNotFound(name_or_selector.to_string()))
    }

    pub fn find_constructor(&self, name_or_selector: &str) -> Result<&ConstructorSpec> {
        let selector = parse_selector(name_or_selector).ok();
        self.constructors
            .iter()
            .find(|c| c.label == name_or_selector || Some(c.selector) == selector)
            .ok_or_else(|| Error::MessageNotFound(name_or_selector.to_string()))
    }

    /// The first byte of an emitted event indexes the event list; the rest
    /// must be exactly the event's declared arguments.
    pub fn decode_event(&self, data: &[u8]) -> Result<DecodedEvent> {
        let (&index, rest) =
            data.split_first().ok_or_else(|| Error::Abi("empty event data".into()))?;
        let spec = self
            .events
            .get(usize::from(index))
            .ok_or_else(|| Error::Abi(format!("unknown event index {index}")))?;

        let mut input = rest;
        for arg in &spec.args {
            skip_value(&self.types, arg.ty.type_id, &mut input, 0).map_err(|e| {
                Error::Abi(format!("event {} argument `{}`: {e}", spec.label, arg.label))
            })?;
        }
        if !input.is_empty() {
            return Err(Error::Abi(format!(
                "event {}: {} trailing bytes",
                spec.label,
                input.len()
            )));
        }
        Ok(DecodedEvent { index, label: spec.label.clone(), data: rest.to_vec() })
    }
}

/// Nesting deeper than this is treated as a malformed registry.
const MAX_TYPE_DEPTH: u32 = 64;

/// Advances `input` past one SCALE value of registry type `id`.
fn skip_value(
    types: &PortableRegistry,
    id: u32,
    input: &mut &[u8],
    depth: u32,
) -> core::result::Result<(), String> {
    if depth > MAX_TYPE_DEPTH {
        return Err("type nesting too deep".into());
    }
    let ty = types.resolve(id).ok_or_else(|| format!("type {id} missing from registry"))?;
    match &ty.type_def {
        TypeDef::Composite(composite) => skip_fields(types, &composite.fields, input, depth),
        TypeDef::Variant(def) => {
            let index = u8::decode(input).map_err(|e| e.to_string())?;
            let variant = def
                .variants
                .iter()
                .find(|v| v.index == index)
                .ok_or_else(|| format!("no variant {index} in type {id}"))?;
            skip_fields(types, &variant.fields, input, depth)
        }
        TypeDef::Sequence(seq) => {
            let Compact(len) = Compact::<u32>::decode(input).map_err(|e| e.to_string())?;
            // zero-sized elements do not occur in event data
            if len as usize > input.len() {
                return Err(format!("sequence of {len} overruns the data"));
            }
            (0..len).try_for_each(|_| skip_value(types, seq.type_param.id, input, depth + 1))
        }
        TypeDef::Array(array) => (0..array.len)
            .try_for_each(|_| skip_value(types, array.type_param.id, input, depth + 1)),
        TypeDef::Tuple(tuple) => tuple
            .fields
            .iter()
            .try_for_each(|field| skip_value(types, field.id, input, depth + 1)),
        TypeDef::Primitive(primitive) => skip_primitive(primitive, input),
        TypeDef::Compact(_) => {
            Compact::<u128>::decode(input).map(drop).map_err(|e| e.to_string())
        }
        TypeDef::BitSequence(_) => Err("bit sequences are not supported".into()),
    }
}

fn skip_fields(
    types: &PortableRegistry,
    fields: &[Field<PortableForm>],
    input: &mut &[u8],
    depth: u32,
) -> core::result::Result<(), String> {
    fields.iter().try_for_each(|field| skip_value(types, field.ty.id, input, depth + 1))
}

fn skip_primitive(
    primitive: &TypeDefPrimitive,
    input: &mut &[u8],
) -> core::result::Result<(), String> {
    let width = match primitive {
        TypeDefPrimitive::Bool => return bool::decode(input).map(drop).map_err(|e| e.to_string()),
        TypeDefPrimitive::Char => {
            let code = u32::decode(input).map_err(|e| e.to_string())?;
            return char::from_u32(code).map(drop).ok_or_else(|| format!("invalid char {code:#x}"));
        }
        TypeDefPrimitive::Str => return String::decode(input).map(drop).map_err(|e| e.to_string()),
        TypeDefPrimitive::U8 | TypeDefPrimitive::I8 => 1,
        TypeDefPrimitive::U16 | TypeDefPrimitive::I16 => 2,
        TypeDefPrimitive::U32 | TypeDefPrimitive::I32 => 4,
        TypeDefPrimitive::U64 | TypeDefPrimitive::I64 => 8,
        TypeDefPrimitive::U128 | TypeDefPrimitive::I128 => 16,
        TypeDefPrimitive::U256 | TypeDefPrimitive::I256 => 32,
    };
    if input.len() < width {
        return Err("data ends early".into());
    }
    *input = &input[width..];
    Ok(())
}

fn encode_call(selector: &Selector, args: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(selector.len() + args.len());
    data.extend_from_slice(selector);
    data.extend_from_slice(args);
    data
}

pub fn parse_selector(text: &str) -> Result<Selector> {
    let digits = text
        .strip_prefix("0x")
        .ok_or_else(|| Error::Abi(format!("selector `{text}` lacks 0x prefix")))?;
    let mut selector = [0u8; 4];
    hex::decode_to_slice(digits, &mut selector)
        .map_err(|e| Error::Abi(format!("selector `{text}`: {e}")))?;
    Ok(selector)
}

fn deserialize_selector<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Selector, D::Error> {
    let text = String::deserialize(deserializer)?;
    parse_selector(&text).map_err(serde::de::Error::custom)
}
