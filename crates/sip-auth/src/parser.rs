//! nom parsers for the header values read by this crate
//!
//! Covers the WWW-Authenticate / Proxy-Authenticate challenge grammar of
//! RFC 3261 section 25.1 and the sec-mechanism grammar of RFC 3329 used by
//! Security-Client, Security-Server and Security-Verify. Parsers work on
//! bytes and follow the ABNF names noted above each function.

use nom::{
    branch::alt,
    bytes::complete::{tag, take, take_while, take_while1},
    combinator::{all_consuming, map, map_res, opt, recognize, verify},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, separated_pair, terminated, tuple},
    IResult,
};
use std::str;

/// Type alias for parser results
pub type ParseResult<'a, O> = IResult<&'a [u8], O>;

/// A named parameter with an optional value, unescaped
pub type Param = (String, Option<String>);

fn is_wsp(c: u8) -> bool {
    c == b' ' || c == b'\t' || c == b'\r' || c == b'\n'
}

// SWS = [LWS]
fn sws(input: &[u8]) -> ParseResult<&[u8]> {
    take_while(is_wsp)(input)
}

// LWS = [*WSP CRLF] 1*WSP
fn lws(input: &[u8]) -> ParseResult<&[u8]> {
    take_while1(is_wsp)(input)
}

// EQUAL = SWS "=" SWS
fn equal(input: &[u8]) -> ParseResult<&[u8]> {
    recognize(tuple((sws, tag(b"="), sws)))(input)
}

// COMMA = SWS "," SWS
fn comma(input: &[u8]) -> ParseResult<&[u8]> {
    recognize(tuple((sws, tag(b","), sws)))(input)
}

// SEMI = SWS ";" SWS
fn semi(input: &[u8]) -> ParseResult<&[u8]> {
    recognize(tuple((sws, tag(b";"), sws)))(input)
}

pub(crate) fn is_token_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || b"-.!%*_+`'~".contains(&c)
}

// token = 1*(alphanum / "-" / "." / "!" / "%" / "*" / "_" / "+" / "`" / "'" / "~")
fn token(input: &[u8]) -> ParseResult<&[u8]> {
    take_while1(is_token_char)(input)
}

fn token_string(input: &[u8]) -> ParseResult<String> {
    map_res(token, |bytes| str::from_utf8(bytes).map(String::from))(input)
}

// quoted-pair = "\" (%x00-09 / %x0B-0C / %x0E-7F)
fn quoted_pair(input: &[u8]) -> ParseResult<&[u8]> {
    recognize(pair(
        tag(b"\\"),
        verify(take(1usize), |c: &[u8]| c[0] != b'\r' && c[0] != b'\n'),
    ))(input)
}

// qdtext = LWS / %x21 / %x23-5B / %x5D-7E / UTF8-NONASCII
fn qdtext(input: &[u8]) -> ParseResult<&[u8]> {
    take_while1(|c: u8| c != b'"' && c != b'\\')(input)
}

// quoted-string = SWS DQUOTE *(qdtext / quoted-pair ) DQUOTE
// Returns the raw content between the quotes, escapes included.
fn quoted_string(input: &[u8]) -> ParseResult<&[u8]> {
    preceded(
        sws,
        delimited(tag(b"\""), recognize(many0(alt((qdtext, quoted_pair)))), tag(b"\"")),
    )(input)
}

fn unescape(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut bytes = raw.iter();
    while let Some(&b) = bytes.next() {
        match b {
            b'\\' => {
                if let Some(&escaped) = bytes.next() {
                    out.push(escaped);
                }
            }
            _ => out.push(b),
        }
    }
    out
}

fn unquoted_string(input: &[u8]) -> ParseResult<String> {
    map_res(quoted_string, |raw| String::from_utf8(unescape(raw)))(input)
}

// auth-value = token / quoted-string
fn auth_value(input: &[u8]) -> ParseResult<String> {
    alt((unquoted_string, token_string))(input)
}

// auth-param = auth-param-name EQUAL auth-value
// Names are lowercased; RFC 2617 parameter names are case-insensitive.
fn auth_param(input: &[u8]) -> ParseResult<(String, String)> {
    map(
        separated_pair(token_string, equal, auth_value),
        |(name, value)| (name.to_ascii_lowercase(), value),
    )(input)
}

// challenge = auth-scheme LWS auth-param *(COMMA auth-param)
pub fn challenge(input: &[u8]) -> ParseResult<(String, Vec<(String, String)>)> {
    all_consuming(delimited(
        sws,
        pair(token_string, preceded(lws, separated_list1(comma, auth_param))),
        sws,
    ))(input)
}

// gen-value = token / host / quoted-string
fn mech_value(input: &[u8]) -> ParseResult<String> {
    alt((unquoted_string, token_string))(input)
}

// mech-parameters = generic-param (and the RFC 3329 named forms, all of
// which fit generic-param)
fn mech_param(input: &[u8]) -> ParseResult<Param> {
    pair(token_string, opt(preceded(equal, mech_value)))(input)
}

// sec-mechanism = mechanism-name *(SEMI mech-parameters)
pub fn security_mechanism(input: &[u8]) -> ParseResult<(String, Vec<Param>)> {
    all_consuming(delimited(
        sws,
        pair(token_string, many0(preceded(semi, mech_param))),
        terminated(sws, opt(tag(b";"))),
    ))(input)
}

/// Render `value` as a quoted-string, escaping `"` and `\`
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
