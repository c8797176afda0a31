//! JPEG 2000 codestream header parameters.
//!
//! The same parameters show up in two places: the binary fields of an MXF
//! `JPEG2000PictureSubDescriptor`, and the descriptor XML a composition
//! carries. Both decode into [`J2kHeaderParameters`], so the checks in
//! [`ht`] and the application profiles don't care where they came from.

use winnow::{
    Parser as _,
    binary::{be_u16, be_u32, u8},
    error::EmptyError,
    token::rest,
};
use xmltree::{Element, XMLNode};

use crate::{error::J2kError, header::objects::Jpeg2000SubDescriptor};

pub mod ht;
pub mod profile;

/// `Ssiz`, `XRsiz`, and `YRsiz` for one component.
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub struct ComponentSizing {
    pub ssiz: u8,
    pub xrsiz: u8,
    pub yrsiz: u8,
}

impl ComponentSizing {
    /// The component's bit depth. `Ssiz` stores it minus one, with the top
    /// bit marking signed samples.
    pub fn bit_depth(&self) -> u8 {
        (self.ssiz & 0x7f) + 1
    }

    pub fn is_signed(&self) -> bool {
        self.ssiz & 0x80 != 0
    }
}

/// The CAP marker: which parts of JPEG 2000 the codestream needs.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct Capabilities {
    pub pcap: u32,
    pub ccap: Vec<u16>,
}

impl Capabilities {
    /// `Pcap` with only the Part 15 (HTJ2K) bit set.
    pub const PART15_ONLY: u32 = 1 << (32 - 15);

    /// The Part 15 `Ccap` value, if any.
    ///
    /// `Ccap` entries follow the set bits of `Pcap` in order.
    pub fn ccap15(&self) -> Option<u16> {
        if self.pcap & Self::PART15_ONLY == 0 {
            return None;
        }
        let index = (self.pcap >> (32 - 14)).count_ones() as usize;
        self.ccap.get(index).copied()
    }
}

/// The COD marker.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct CodingStyleDefault {
    pub scod: u8,
    pub progression_order: u8,
    pub number_of_layers: u16,
    pub multiple_component_transform: u8,
    pub decomposition_levels: u8,

    /// Code-block width exponent, minus 2.
    pub xcb: u8,

    /// Code-block height exponent, minus 2.
    pub ycb: u8,
    pub code_block_style: u8,
    pub transformation: u8,

    /// One `PPy << 4 | PPx` byte per resolution level, when `Scod` says
    /// precincts are given.
    pub precinct_sizes: Vec<u8>,
}

impl CodingStyleDefault {
    /// Whether the 5-3 reversible wavelet is used.
    pub fn is_reversible(&self) -> bool {
        self.transformation == 1
    }

    pub fn code_block_width(&self) -> u32 {
        1 << (self.xcb as u32 + 2).min(31)
    }

    pub fn code_block_height(&self) -> u32 {
        1 << (self.ycb as u32 + 2).min(31)
    }

    /// Decodes `Scod`, `SGcod`, and `SPcod`.
    pub fn parse(mut bytes: &[u8]) -> Result<CodingStyleDefault, J2kError> {
        let input = &mut bytes;
        let short = |_: EmptyError| J2kError::TruncatedCodingStyle;

        let scod = u8.parse_next(input).map_err(short)?;
        let progression_order = u8.parse_next(input).map_err(short)?;
        let number_of_layers = be_u16.parse_next(input).map_err(short)?;
        let multiple_component_transform = u8.parse_next(input).map_err(short)?;
        let decomposition_levels = u8.parse_next(input).map_err(short)?;
        let xcb = u8.parse_next(input).map_err(short)?;
        let ycb = u8.parse_next(input).map_err(short)?;
        let code_block_style = u8.parse_next(input).map_err(short)?;
        let transformation = u8.parse_next(input).map_err(short)?;

        let precinct_sizes = if scod & 0x01 != 0 {
            let needed = decomposition_levels as usize + 1;
            if input.len() < needed {
                return Err(J2kError::TruncatedCodingStyle);
            }
            input[..needed].to_vec()
        } else {
            Vec::new()
        };

        Ok(CodingStyleDefault {
            scod,
            progression_order,
            number_of_layers,
            multiple_component_transform,
            decomposition_levels,
            xcb,
            ycb,
            code_block_style,
            transformation,
            precinct_sizes,
        })
    }
}

/// The QCD marker.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct QuantizationDefault {
    pub sqcd: u8,
    pub spqcd: Vec<u8>,
}

impl QuantizationDefault {
    /// The number of guard bits, from the top 3 bits of `Sqcd`.
    pub fn guard_bits(&self) -> u8 {
        self.sqcd >> 5
    }

    pub fn parse(mut bytes: &[u8]) -> Result<QuantizationDefault, J2kError> {
        let input = &mut bytes;
        let sqcd = u8
            .parse_next(input)
            .map_err(|_: EmptyError| J2kError::TruncatedQuantization)?;
        let spqcd: &[u8] = rest
            .parse_next(input)
            .map_err(|_: EmptyError| J2kError::TruncatedQuantization)?;

        Ok(QuantizationDefault {
            sqcd,
            spqcd: spqcd.to_vec(),
        })
    }
}

/// A decoded JPEG 2000 codestream header.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct J2kHeaderParameters {
    pub rsiz: u16,
    pub xsiz: u32,
    pub ysiz: u32,
    pub xosiz: u32,
    pub yosiz: u32,
    pub xtsiz: u32,
    pub ytsiz: u32,
    pub xtosiz: u32,
    pub ytosiz: u32,
    pub csiz: Vec<ComponentSizing>,
    pub cap: Option<Capabilities>,
    pub cod: Option<CodingStyleDefault>,
    pub qcd: Option<QuantizationDefault>,
}

impl J2kHeaderParameters {
    /// Builds the parameters from an MXF sub-descriptor.
    pub fn from_sub_descriptor(
        sub: &Jpeg2000SubDescriptor,
    ) -> Result<J2kHeaderParameters, J2kError> {
        if sub.csiz as usize != sub.picture_component_sizing.len() {
            return Err(J2kError::ComponentCountMismatch {
                csiz: sub.csiz,
                records: sub.picture_component_sizing.len(),
            });
        }

        let cap = sub
            .extended_capabilities
            .as_deref()
            .map(parse_extended_capabilities)
            .transpose()?;

        Ok(J2kHeaderParameters {
            rsiz: sub.rsiz,
            xsiz: sub.xsiz,
            ysiz: sub.ysiz,
            xosiz: sub.xosiz,
            yosiz: sub.yosiz,
            xtsiz: sub.xtsiz,
            ytsiz: sub.ytsiz,
            xtosiz: sub.xtosiz,
            ytosiz: sub.ytosiz,
            csiz: sub
                .picture_component_sizing
                .iter()
                .map(|[ssiz, xrsiz, yrsiz]| ComponentSizing {
                    ssiz: *ssiz,
                    xrsiz: *xrsiz,
                    yrsiz: *yrsiz,
                })
                .collect(),
            cap,
            cod: sub
                .coding_style_default
                .as_deref()
                .map(CodingStyleDefault::parse)
                .transpose()?,
            qcd: sub
                .quantization_default
                .as_deref()
                .map(QuantizationDefault::parse)
                .transpose()?,
        })
    }

    /// Builds the parameters from a descriptor node handed over by the XML
    /// layer.
    ///
    /// Children are matched by local name, so any namespace prefix works.
    /// The node may be the `JPEG2000SubDescriptor` itself or any ancestor
    /// holding one.
    pub fn from_xml(element: &Element) -> Result<J2kHeaderParameters, J2kError> {
        let node = find_descendant(element, "JPEG2000SubDescriptor").unwrap_or(element);

        let csiz_count: u16 = number(node, "Csiz")?;
        let csiz: Vec<ComponentSizing> = child(node, "PictureComponentSizing")
            .map(|pcs| {
                child_elements(pcs)
                    .map(|c| {
                        Ok(ComponentSizing {
                            ssiz: number(c, "Ssiz")?,
                            xrsiz: number(c, "XRSiz")?,
                            yrsiz: number(c, "YRSiz")?,
                        })
                    })
                    .collect::<Result<Vec<_>, J2kError>>()
            })
            .transpose()?
            .unwrap_or_default();

        if csiz_count as usize != csiz.len() {
            return Err(J2kError::ComponentCountMismatch {
                csiz: csiz_count,
                records: csiz.len(),
            });
        }

        let cap = child(node, "J2KExtendedCapabilities")
            .map(|caps| -> Result<Capabilities, J2kError> {
                let ccap = child(caps, "Ccapi")
                    .map(|list| {
                        child_elements(list)
                            .map(|c| parse_text::<u16>(c, "Ccapi"))
                            .collect::<Result<Vec<_>, _>>()
                    })
                    .transpose()?
                    .unwrap_or_default();
                Ok(Capabilities {
                    pcap: number(caps, "Pcap")?,
                    ccap,
                })
            })
            .transpose()?;

        let cod = optional_hex(node, "CodingStyleDefault")?
            .map(|b| CodingStyleDefault::parse(&b))
            .transpose()?;
        let qcd = optional_hex(node, "QuantizationDefault")?
            .map(|b| QuantizationDefault::parse(&b))
            .transpose()?;

        Ok(J2kHeaderParameters {
            rsiz: number(node, "Rsiz")?,
            xsiz: number(node, "Xsiz")?,
            ysiz: number(node, "Ysiz")?,
            xosiz: number(node, "XOsiz")?,
            yosiz: number(node, "YOsiz")?,
            xtsiz: number(node, "XTsiz")?,
            ytsiz: number(node, "YTsiz")?,
            xtosiz: number(node, "XTOsiz")?,
            ytosiz: number(node, "YTOsiz")?,
            csiz,
            cap,
            cod,
            qcd,
        })
    }

    /// Parses descriptor XML text, then calls [`Self::from_xml`].
    pub fn from_xml_str(xml: &str) -> Result<J2kHeaderParameters, J2kError> {
        let element = Element::parse(xml.as_bytes())?;
        Self::from_xml(&element)
    }

    /// The bit depth shared by every component, if they agree.
    pub fn uniform_bit_depth(&self) -> Option<u8> {
        let first = self.csiz.first()?.bit_depth();
        self.csiz
            .iter()
            .all(|c| c.bit_depth() == first)
            .then_some(first)
    }
}

/// Decodes the MXF `J2KExtendedCapabilities` record: `Pcap`, then a batch of
/// 2-byte `Ccap` values.
fn parse_extended_capabilities(mut bytes: &[u8]) -> Result<Capabilities, J2kError> {
    let input = &mut bytes;
    let bad = |_: EmptyError| J2kError::MalformedCapabilities;

    let pcap = be_u32.parse_next(input).map_err(bad)?;
    if input.is_empty() {
        return Ok(Capabilities {
            pcap,
            ccap: Vec::new(),
        });
    }

    let count = be_u32.parse_next(input).map_err(bad)?;
    let size = be_u32.parse_next(input).map_err(bad)?;
    if (count > 0 && size != 2) || count as usize * 2 != input.len() {
        return Err(J2kError::MalformedCapabilities);
    }

    let ccap = (0..count)
        .map(|_| be_u16.parse_next(input).map_err(bad))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Capabilities { pcap, ccap })
}

fn child_elements(element: &Element) -> impl Iterator<Item = &Element> {
    element.children.iter().flat_map(|cn: &XMLNode| cn.as_element())
}

fn child<'e>(element: &'e Element, name: &str) -> Option<&'e Element> {
    child_elements(element).find(|c| c.name == name)
}

fn find_descendant<'e>(element: &'e Element, name: &str) -> Option<&'e Element> {
    if element.name == name {
        return Some(element);
    }
    child_elements(element).find_map(|c| find_descendant(c, name))
}

fn parse_text<T: core::str::FromStr>(
    element: &Element,
    name: &'static str,
) -> Result<T, J2kError> {
    let text = element
        .get_text()
        .map(|t| t.trim().to_string())
        .unwrap_or_default();
    text.parse::<T>()
        .map_err(|_| J2kError::InvalidNumber {
            element: name,
            text,
        })
}

fn number<T: core::str::FromStr>(element: &Element, name: &'static str) -> Result<T, J2kError> {
    let c = child(element, name).ok_or(J2kError::MissingElement(name))?;
    parse_text(c, name)
}

fn optional_hex(element: &Element, name: &'static str) -> Result<Option<Vec<u8>>, J2kError> {
    let Some(c) = child(element, name) else {
        return Ok(None);
    };

    let text = c.get_text().map(|t| t.trim().to_string()).unwrap_or_default();
    let text = text.strip_prefix("0x").unwrap_or(&text);
    if text.len() % 2 != 0 {
        return Err(J2kError::InvalidHex { element: name });
    }

    (0..text.len())
        .step_by(2)
        .map(|i| {
            text.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or(J2kError::InvalidHex { element: name })
        })
        .collect::<Result<Vec<u8>, _>>()
        .map(Some)
}
