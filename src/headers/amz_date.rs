//! x-amz-date

use chrono::{DateTime, TimeZone, Utc};

/// x-amz-date, `YYYYMMDD'T'HHMMSS'Z'`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmzDate {
    /// instant
    time: DateTime<Utc>,
}

/// `ParseAmzDateError`
#[allow(missing_copy_implementations)]
#[derive(Debug, thiserror::Error)]
#[error("ParseAmzDateError")]
pub struct ParseAmzDateError {
    /// private place holder
    _priv: (),
}

/// nom parser for a fixed-width decimal field
fn digits<'a>(n: usize) -> impl FnMut(&'a str) -> nom::IResult<&'a str, u32> {
    use nom::bytes::complete::take_while_m_n;
    use nom::combinator::map_res;

    map_res(take_while_m_n(n, n, |c: char| c.is_ascii_digit()), |s: &str| {
        s.parse::<u32>()
    })
}

impl AmzDate {
    /// Parses `AmzDate` from header
    /// # Errors
    /// Returns an error if the header is invalid
    pub fn from_header_str(header: &str) -> Result<Self, ParseAmzDateError> {
        /// nom parser
        fn parse(input: &str) -> nom::IResult<&str, [u32; 6]> {
            use nom::{bytes::complete::tag, combinator::all_consuming, sequence::tuple};

            let (input, (year, month, day, _, hour, minute, second, _)) = all_consuming(tuple((
                digits(4),
                digits(2),
                digits(2),
                tag("T"),
                digits(2),
                digits(2),
                digits(2),
                tag("Z"),
            )))(input)?;

            Ok((input, [year, month, day, hour, minute, second]))
        }

        let [year, month, day, hour, minute, second] =
            parse(header).map_err(|_| ParseAmzDateError { _priv: () })?.1;

        let year = i32::try_from(year).map_err(|_| ParseAmzDateError { _priv: () })?;

        match Utc
            .with_ymd_and_hms(year, month, day, hour, minute, second)
            .single()
        {
            Some(time) => Ok(Self { time }),
            None => Err(ParseAmzDateError { _priv: () }),
        }
    }

    /// the instant this date denotes
    #[must_use]
    pub const fn to_datetime(&self) -> DateTime<Utc> {
        self.time
    }

    /// `YYYYMMDD'T'HHMMSS'Z'`
    #[must_use]
    pub fn to_iso8601(&self) -> String {
        self.time.format("%Y%m%dT%H%M%SZ").to_string()
    }
}

/// Checks a credential scope date, `YYYYMMDD`
pub(crate) fn is_valid_scope_date(date: &str) -> bool {
    use nom::{combinator::all_consuming, sequence::tuple};

    let parsed = all_consuming(tuple((digits(4), digits(2), digits(2))))(date);
    match parsed {
        Ok((_, (year, month, day))) => i32::try_from(year)
            .ok()
            .and_then(|year| chrono::NaiveDate::from_ymd_opt(year, month, day))
            .is_some(),
        Err(_) => false,
    }
}
