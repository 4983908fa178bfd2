//! Encoding negotiation based on the Accept-Encoding header
//!
//! Preference is decided by the server: the configured rule list is scanned in
//! order and the first rule the client accepts is selected. Client quality
//! values only matter as a yes/no signal, so `q=0` excludes an encoding and any
//! positive weight accepts it. A `*` entry accepts every encoding the client
//! did not list explicitly.

use crate::rule::CompressionRule;
use hyper::HeaderMap;
use hyper::header::ACCEPT_ENCODING;

/// A single entry of an Accept-Encoding header
#[derive(Debug, Clone, PartialEq)]
pub struct Coding {
	/// Lowercased encoding token, or `*`
	pub token: String,
	/// Quality factor (0.0 to 1.0)
	pub quality: f32,
}

impl Coding {
	/// Parses an entry such as `gzip;q=0.8`
	///
	/// # Examples
	///
	/// ```
	/// use pressed_static::negotiation::Coding;
	///
	/// let coding = Coding::parse("GZip; q=0.8").unwrap();
	/// assert_eq!(coding.token, "gzip");
	/// assert_eq!(coding.quality, 0.8);
	///
	/// let bare = Coding::parse("br").unwrap();
	/// assert_eq!(bare.quality, 1.0);
	///
	/// assert!(Coding::parse("  ").is_none());
	/// ```
	pub fn parse(s: &str) -> Option<Self> {
		let mut parts = s.split(';');
		let token = parts.next()?.trim();
		if token.is_empty() {
			return None;
		}

		let mut quality = 1.0;
		for param in parts {
			if let Some((key, value)) = param.split_once('=')
				&& key.trim().eq_ignore_ascii_case("q")
				&& let Ok(q) = value.trim().parse::<f32>()
				&& q.is_finite()
			{
				quality = q.clamp(0.0, 1.0);
			}
		}

		Some(Self {
			token: token.to_ascii_lowercase(),
			quality,
		})
	}

	/// Whether this entry marks its token acceptable
	pub fn is_acceptable(&self) -> bool {
		self.quality > 0.0
	}
}

/// The set of encodings a request declares acceptable
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcceptEncoding {
	codings: Vec<Coding>,
}

impl AcceptEncoding {
	/// Parses an Accept-Encoding header value
	///
	/// # Examples
	///
	/// ```
	/// use pressed_static::negotiation::AcceptEncoding;
	///
	/// let accepted = AcceptEncoding::parse("br;q=0.9, GZIP, identity;q=0");
	/// assert!(accepted.accepts("br"));
	/// assert!(accepted.accepts("gzip"));
	/// assert!(!accepted.accepts("zstd"));
	/// ```
	pub fn parse(header: &str) -> Self {
		Self {
			codings: header.split(',').filter_map(Coding::parse).collect(),
		}
	}

	/// Collects every Accept-Encoding value present in the headers
	///
	/// A missing header yields an empty set, which accepts nothing.
	pub fn from_headers(headers: &HeaderMap) -> Self {
		let codings = headers
			.get_all(ACCEPT_ENCODING)
			.iter()
			.filter_map(|value| value.to_str().ok())
			.flat_map(|value| value.split(','))
			.filter_map(Coding::parse)
			.collect();
		Self { codings }
	}

	/// An empty declaration
	pub fn empty() -> Self {
		Self::default()
	}

	/// Whether no encodings were declared
	pub fn is_empty(&self) -> bool {
		self.codings.is_empty()
	}

	/// The parsed entries in header order
	pub fn codings(&self) -> &[Coding] {
		&self.codings
	}

	/// Whether the client accepts the given encoding token
	///
	/// An explicit entry for the token decides. Without one, a `*` entry
	/// decides. Otherwise the token is not accepted.
	///
	/// # Examples
	///
	/// ```
	/// use pressed_static::negotiation::AcceptEncoding;
	///
	/// let accepted = AcceptEncoding::parse("*, gzip;q=0");
	/// assert!(accepted.accepts("br"));
	/// assert!(!accepted.accepts("gzip"));
	/// ```
	pub fn accepts(&self, token: &str) -> bool {
		let explicit = self
			.codings
			.iter()
			.filter(|c| c.token.eq_ignore_ascii_case(token))
			.max_by(|a, b| a.quality.total_cmp(&b.quality));
		if let Some(coding) = explicit {
			return coding.is_acceptable();
		}

		self.codings
			.iter()
			.filter(|c| c.token == "*")
			.any(Coding::is_acceptable)
	}
}

/// The outcome of negotiating one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationResult<'a> {
	/// The highest-priority configured rule the client accepts
	Selected(&'a CompressionRule),
	/// No configured rule is acceptable; serve the original
	Identity,
}

impl<'a> NegotiationResult<'a> {
	/// The selected rule, if any
	pub fn rule(self) -> Option<&'a CompressionRule> {
		match self {
			NegotiationResult::Selected(rule) => Some(rule),
			NegotiationResult::Identity => None,
		}
	}
}

/// Picks the first configured rule that the client accepts
///
/// # Examples
///
/// ```
/// use pressed_static::{CompressionRule, negotiate};
/// use pressed_static::negotiation::{AcceptEncoding, NegotiationResult};
///
/// let rules = vec![CompressionRule::brotli(), CompressionRule::gzip()];
///
/// // Server order wins over client order.
/// let accepted = AcceptEncoding::parse("gzip, br");
/// assert_eq!(negotiate(&rules, &accepted), NegotiationResult::Selected(&rules[0]));
///
/// let none = AcceptEncoding::parse("deflate");
/// assert_eq!(negotiate(&rules, &none), NegotiationResult::Identity);
/// ```
pub fn negotiate<'a>(
	rules: &'a [CompressionRule],
	accepted: &AcceptEncoding,
) -> NegotiationResult<'a> {
	match acceptable_rules(rules, accepted).next() {
		Some(rule) => NegotiationResult::Selected(rule),
		None => NegotiationResult::Identity,
	}
}

/// Every configured rule the client accepts, in configured order
pub fn acceptable_rules<'a>(
	rules: &'a [CompressionRule],
	accepted: &AcceptEncoding,
) -> impl Iterator<Item = &'a CompressionRule> {
	rules.iter().filter(|rule| accepted.accepts(&rule.encoding))
}

#[cfg(test)]
mod tests {
	use super::*;
	use hyper::header::HeaderValue;
	use rstest::{fixture, rstest};

	#[fixture]
	fn rules() -> Vec<CompressionRule> {
		vec![CompressionRule::gzip(), CompressionRule::brotli()]
	}

	#[rstest]
	fn test_empty_rules_never_select(#[values("gzip", "br", "*", "")] header: &str) {
		let accepted = AcceptEncoding::parse(header);
		assert_eq!(negotiate(&[], &accepted), NegotiationResult::Identity);
	}

	#[rstest]
	fn test_empty_header_selects_nothing(rules: Vec<CompressionRule>) {
		assert_eq!(
			negotiate(&rules, &AcceptEncoding::empty()),
			NegotiationResult::Identity
		);
		assert_eq!(
			negotiate(&rules, &AcceptEncoding::parse(" , ")),
			NegotiationResult::Identity
		);
	}

	#[rstest]
	#[case("br, gzip")]
	#[case("gzip, br")]
	#[case("br;q=1.0, gzip;q=0.1")]
	fn test_server_order_wins(rules: Vec<CompressionRule>, #[case] header: &str) {
		let accepted = AcceptEncoding::parse(header);
		assert_eq!(negotiate(&rules, &accepted).rule(), Some(&rules[0]));
	}

	#[rstest]
	fn test_case_insensitive_tokens(rules: Vec<CompressionRule>) {
		let accepted = AcceptEncoding::parse("BR");
		assert_eq!(negotiate(&rules, &accepted).rule(), Some(&rules[1]));

		let shouty = vec![CompressionRule::new("GZIP", ".gz")];
		let accepted = AcceptEncoding::parse("gzip");
		assert_eq!(negotiate(&shouty, &accepted).rule(), Some(&shouty[0]));
	}

	#[rstest]
	fn test_wildcard_respects_server_order(rules: Vec<CompressionRule>) {
		let accepted = AcceptEncoding::parse("*");
		assert_eq!(negotiate(&rules, &accepted).rule(), Some(&rules[0]));
	}

	#[rstest]
	fn test_explicit_exclusion_beats_wildcard(rules: Vec<CompressionRule>) {
		let accepted = AcceptEncoding::parse("*, gzip;q=0");
		assert_eq!(negotiate(&rules, &accepted).rule(), Some(&rules[1]));
	}

	#[rstest]
	fn test_zero_weighted_wildcard_accepts_nothing_else(rules: Vec<CompressionRule>) {
		let accepted = AcceptEncoding::parse("br, *;q=0");
		assert_eq!(negotiate(&rules, &accepted).rule(), Some(&rules[1]));

		let accepted = AcceptEncoding::parse("*;q=0");
		assert_eq!(negotiate(&rules, &accepted), NegotiationResult::Identity);
	}

	#[rstest]
	fn test_acceptable_rules_in_configured_order(rules: Vec<CompressionRule>) {
		let accepted = AcceptEncoding::parse("br, gzip, zstd");
		let order: Vec<_> = acceptable_rules(&rules, &accepted)
			.map(|r| r.encoding.as_str())
			.collect();
		assert_eq!(order, vec!["gzip", "br"]);
	}

	#[rstest]
	#[case("gzip;q=2", 1.0)]
	#[case("gzip;q=-1", 0.0)]
	#[case("gzip;q=abc", 1.0)]
	#[case("gzip; Q=0.5", 0.5)]
	#[case("gzip;level=9;q=0.3", 0.3)]
	fn test_quality_parsing(#[case] entry: &str, #[case] expected: f32) {
		let coding = Coding::parse(entry).unwrap();
		assert_eq!(coding.token, "gzip");
		assert_eq!(coding.quality, expected);
	}

	#[rstest]
	fn test_from_headers_merges_values() {
		let mut headers = HeaderMap::new();
		headers.append(ACCEPT_ENCODING, HeaderValue::from_static("gzip;q=0"));
		headers.append(ACCEPT_ENCODING, HeaderValue::from_static("br"));

		let accepted = AcceptEncoding::from_headers(&headers);
		assert_eq!(accepted.codings().len(), 2);
		assert!(!accepted.accepts("gzip"));
		assert!(accepted.accepts("br"));
	}

	#[rstest]
	fn test_from_headers_without_header_is_empty() {
		assert!(AcceptEncoding::from_headers(&HeaderMap::new()).is_empty());
	}
}
