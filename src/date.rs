//! Date parsing for `std.read_date_string`.
//!
//! Patterns use Unicode date-field symbols (`yyyy-MM-dd'T'HH:mm`). They are
//! translated to `chrono` format strings; only English month and weekday names
//! are recognised whatever locale is requested.

use chrono::{ DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc };
use chrono_tz::Tz ;



/// Parses `value` under `pattern` and returns milliseconds since the Unix epoch.
///
/// Date-only patterns resolve to midnight and time-only patterns to today. A
/// value without an offset is read as local time in `zone` (an IANA name,
/// default UTC). `None` if anything fails to parse.
pub fn parse_date( value: &str, pattern: &str, zone: Option<&str> ) -> Option<i64> {

	let format = translate_pattern( pattern );
	let zone = match zone {
		Some( name ) => name.parse::<Tz>()
			.map_err(| err | tracing::warn!( zone = name, error = %err, "unknown time zone" ))
			.ok()?,
		None => Tz::UTC,
	};

	if let Ok( stamped ) = DateTime::parse_from_str( value, &format ) {
		return Some( stamped.timestamp_millis() )
	}

	let local = NaiveDateTime::parse_from_str( value, &format )
		.or_else(|_| NaiveDate::parse_from_str( value, &format ).map(| date | date.and_time( NaiveTime::MIN )))
		.or_else(|_| NaiveTime::parse_from_str( value, &format )
			.map(| time | Utc::now().with_timezone( &zone ).date_naive().and_time( time ))
		)
		.ok()?;

	zone.from_local_datetime( &local )
		.earliest()
		.map(| resolved | resolved.timestamp_millis() )

}

/// Converts a Unicode date pattern into a `chrono` format string.
pub fn translate_pattern( pattern: &str ) -> String {

	let mut format = String::with_capacity( pattern.len() * 2 );
	let mut chars = pattern.chars().peekable();

	while let Some( symbol ) = chars.next() {
		match symbol {
			'\'' => {
				if chars.peek() == Some( &'\'' ) {
					chars.next();
					format.push( '\'' );
					continue ;
				}
				while let Some( literal ) = chars.next() {
					if literal != '\'' { push_literal( &mut format, literal ); continue }
					match chars.peek() {
						Some( '\'' ) => { chars.next(); format.push( '\'' ); },
						_ => break,
					}
				}
			},
			symbol if symbol.is_ascii_alphabetic() => {
				let mut width = 1 ;
				while chars.peek() == Some( &symbol ) {
					chars.next();
					width += 1 ;
				}
				match field( symbol, width ) {
					Some( spec ) => format.push_str( spec ),
					None => ( 0..width ).for_each(|_| push_literal( &mut format, symbol )),
				}
			},
			literal => push_literal( &mut format, literal ),
		}
	}

	format

}

fn push_literal( format: &mut String, literal: char ) {
	match literal {
		'%' => format.push_str( "%%" ),
		literal => format.push( literal ),
	}
}

fn field( symbol: char, width: usize ) -> Option<&'static str> {
	Some( match ( symbol, width ) {
		( 'y' | 'u', 2 ) => "%y",
		( 'y' | 'u', _ ) => "%Y",
		( 'M' | 'L', 1 | 2 ) => "%m",
		( 'M' | 'L', 3 ) => "%b",
		( 'M' | 'L', _ ) => "%B",
		( 'd', _ ) => "%d",
		( 'D', _ ) => "%j",
		( 'E', 1..=3 ) => "%a",
		( 'E', _ ) => "%A",
		( 'a', _ ) => "%p",
		( 'H', _ ) => "%H",
		( 'h', _ ) => "%I",
		( 'm', _ ) => "%M",
		( 's', _ ) => "%S",
		( 'S', 3 ) => "%3f",
		( 'S', 6 ) => "%6f",
		( 'S', 9 ) => "%9f",
		( 'Z' | 'X' | 'x', _ ) => "%z",
		_ => return None,
	})
}
