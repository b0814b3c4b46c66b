//! Conversion from Arrow RecordBatch to row-based Records.
//!
//! Every value is rendered in the text form it takes in the written CSV:
//! nulls (and float NaN) become empty fields, booleans are `True`/`False`,
//! floats always carry a fractional part or exponent, and temporal values use
//! ISO-8601 dates with a space between date and time. Types without a
//! dedicated rendering fall back to Arrow's display formatter.

use anyhow::{Context, Result};
use arrow::array::timezone::Tz;
use arrow::array::*;
use arrow::datatypes::{
    ArrowTimestampType, DataType, Date32Type, Date64Type, Decimal128Type, Decimal256Type,
    Float32Type, Float64Type, Int8Type, Int16Type, Int32Type, Int64Type, TimeUnit,
    TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
    TimestampSecondType, UInt8Type, UInt16Type, UInt32Type, UInt64Type,
};
use arrow::record_batch::RecordBatch;
use arrow::temporal_conversions::{as_datetime, as_datetime_with_timezone};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use chrono::Timelike;

use crate::formats::Record;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TZ_OFFSET_FORMAT: &str = "%:z";

/// Convert an Arrow RecordBatch to a vector of Records
pub fn record_batch_to_records(batch: &RecordBatch) -> Result<Vec<Record>> {
    let num_rows = batch.num_rows();
    let num_columns = batch.num_columns();

    if num_rows == 0 {
        return Ok(Vec::new());
    }

    let schema = batch.schema();
    let mut column_strings: Vec<Vec<String>> = Vec::with_capacity(num_columns);
    for (col_idx, array) in batch.columns().iter().enumerate() {
        let strings = array_to_strings(array.as_ref()).with_context(|| {
            format!(
                "Failed to render column '{}' ({:?})",
                schema.field(col_idx).name(),
                array.data_type()
            )
        })?;
        column_strings.push(strings);
    }

    // Transpose to rows, moving each rendered value out of its column
    let mut columns: Vec<std::vec::IntoIter<String>> =
        column_strings.into_iter().map(Vec::into_iter).collect();
    let mut records = Vec::with_capacity(num_rows);
    for _ in 0..num_rows {
        let fields = columns
            .iter_mut()
            .map(|col| col.next().unwrap_or_default())
            .collect();
        records.push(Record { fields });
    }

    Ok(records)
}

/// Convert an Arrow array to a vector of string representations
fn array_to_strings(array: &dyn Array) -> Result<Vec<String>> {
    let mut strings = Vec::with_capacity(array.len());

    match array.data_type() {
        DataType::Boolean => {
            let arr = as_boolean_array(array);
            for i in 0..arr.len() {
                strings.push(if arr.is_null(i) {
                    String::new()
                } else if arr.value(i) {
                    "True".to_string()
                } else {
                    "False".to_string()
                });
            }
        }
        DataType::Int8 => convert_primitive::<Int8Type>(array, &mut strings),
        DataType::Int16 => convert_primitive::<Int16Type>(array, &mut strings),
        DataType::Int32 => convert_primitive::<Int32Type>(array, &mut strings),
        DataType::Int64 => convert_primitive::<Int64Type>(array, &mut strings),
        DataType::UInt8 => convert_primitive::<UInt8Type>(array, &mut strings),
        DataType::UInt16 => convert_primitive::<UInt16Type>(array, &mut strings),
        DataType::UInt32 => convert_primitive::<UInt32Type>(array, &mut strings),
        DataType::UInt64 => convert_primitive::<UInt64Type>(array, &mut strings),
        DataType::Float32 => {
            let arr = as_primitive_array::<Float32Type>(array);
            for i in 0..arr.len() {
                strings.push(if arr.is_null(i) {
                    String::new()
                } else {
                    format_float(arr.value(i) as f64, |v| format!("{:?}", v as f32))
                });
            }
        }
        DataType::Float64 => {
            let arr = as_primitive_array::<Float64Type>(array);
            for i in 0..arr.len() {
                strings.push(if arr.is_null(i) {
                    String::new()
                } else {
                    format_float(arr.value(i), |v| format!("{:?}", v))
                });
            }
        }
        DataType::Utf8 => {
            let arr = as_string_array(array);
            for i in 0..arr.len() {
                strings.push(if arr.is_null(i) {
                    String::new()
                } else {
                    arr.value(i).to_string()
                });
            }
        }
        DataType::LargeUtf8 => {
            let arr = as_largestring_array(array);
            for i in 0..arr.len() {
                strings.push(if arr.is_null(i) {
                    String::new()
                } else {
                    arr.value(i).to_string()
                });
            }
        }
        DataType::Binary => {
            let arr = as_generic_binary_array::<i32>(array);
            for i in 0..arr.len() {
                strings.push(if arr.is_null(i) {
                    String::new()
                } else {
                    hex::encode(arr.value(i))
                });
            }
        }
        DataType::LargeBinary => {
            let arr = as_generic_binary_array::<i64>(array);
            for i in 0..arr.len() {
                strings.push(if arr.is_null(i) {
                    String::new()
                } else {
                    hex::encode(arr.value(i))
                });
            }
        }
        DataType::Date32 => {
            let arr = as_primitive_array::<Date32Type>(array);
            let epoch = chrono::NaiveDate::from_ymd_opt(1970, 1, 1).context("Invalid epoch")?;
            for i in 0..arr.len() {
                strings.push(if arr.is_null(i) {
                    String::new()
                } else {
                    let days = arr.value(i);
                    let date = epoch
                        .checked_add_signed(chrono::Duration::days(days as i64))
                        .with_context(|| format!("Date out of range: {} days", days))?;
                    date.format(DATE_FORMAT).to_string()
                });
            }
        }
        DataType::Date64 => {
            let arr = as_primitive_array::<Date64Type>(array);
            for i in 0..arr.len() {
                strings.push(if arr.is_null(i) {
                    String::new()
                } else {
                    let millis = arr.value(i);
                    let datetime = chrono::DateTime::from_timestamp_millis(millis)
                        .with_context(|| format!("Date out of range: {} ms", millis))?;
                    datetime.format(DATE_FORMAT).to_string()
                });
            }
        }
        DataType::Timestamp(unit, tz) => {
            let tz = tz.as_deref();
            match unit {
                TimeUnit::Second => {
                    convert_timestamp::<TimestampSecondType>(array, tz, &mut strings)?
                }
                TimeUnit::Millisecond => {
                    convert_timestamp::<TimestampMillisecondType>(array, tz, &mut strings)?
                }
                TimeUnit::Microsecond => {
                    convert_timestamp::<TimestampMicrosecondType>(array, tz, &mut strings)?
                }
                TimeUnit::Nanosecond => {
                    convert_timestamp::<TimestampNanosecondType>(array, tz, &mut strings)?
                }
            }
        }
        DataType::Decimal128(_, scale) => {
            let arr = as_primitive_array::<Decimal128Type>(array);
            for i in 0..arr.len() {
                strings.push(if arr.is_null(i) {
                    String::new()
                } else {
                    apply_decimal_scale(&arr.value(i).to_string(), *scale)
                });
            }
        }
        DataType::Decimal256(_, scale) => {
            let arr = as_primitive_array::<Decimal256Type>(array);
            for i in 0..arr.len() {
                strings.push(if arr.is_null(i) {
                    String::new()
                } else {
                    apply_decimal_scale(&arr.value(i).to_string(), *scale)
                });
            }
        }
        _ => convert_with_formatter(array, &mut strings)?,
    }

    Ok(strings)
}

/// Helper to convert primitive arrays
fn convert_primitive<T: ArrowPrimitiveType>(array: &dyn Array, strings: &mut Vec<String>)
where
    T::Native: std::fmt::Display,
{
    let arr = as_primitive_array::<T>(array);
    for i in 0..arr.len() {
        strings.push(if arr.is_null(i) {
            String::new()
        } else {
            arr.value(i).to_string()
        });
    }
}

/// Render a finite float with `render`; NaN is an empty field
///
/// Exponents carry a sign and at least two digits (`1e+20`, `2.5e-07`).
fn format_float(value: f64, render: impl Fn(f64) -> String) -> String {
    if value.is_nan() {
        String::new()
    } else if value.is_infinite() {
        let text = if value > 0.0 { "inf" } else { "-inf" };
        text.to_string()
    } else {
        pad_exponent(render(value))
    }
}

fn pad_exponent(text: String) -> String {
    let Some((mantissa, exponent)) = text.split_once('e') else {
        return text;
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{}e{}{:0>2}", mantissa, sign, digits)
}

/// Convert timestamp arrays to strings, applying the column time zone if any
///
/// The fractional precision is chosen once per column: the finest of
/// milliseconds, microseconds or nanoseconds that any value needs. A naive
/// column whose values all fall on midnight is written as plain dates.
fn convert_timestamp<T: ArrowTimestampType>(
    array: &dyn Array,
    tz: Option<&str>,
    strings: &mut Vec<String>,
) -> Result<()> {
    let arr = as_primitive_array::<T>(array);
    let tz = tz
        .map(|name| name.parse::<Tz>())
        .transpose()
        .context("Invalid timestamp time zone")?;

    match tz {
        Some(tz) => {
            let values = (0..arr.len())
                .map(|i| {
                    if arr.is_null(i) {
                        return Ok(None);
                    }
                    as_datetime_with_timezone::<T>(arr.value(i), tz)
                        .with_context(|| format!("Timestamp out of range: {}", arr.value(i)))
                        .map(Some)
                })
                .collect::<Result<Vec<_>>>()?;

            let digits = fraction_digits(values.iter().flatten().map(|dt| dt.nanosecond()));
            let format = format!("{}{}", timestamp_format(digits), TZ_OFFSET_FORMAT);
            strings.extend(values.iter().map(|value| {
                value
                    .as_ref()
                    .map(|dt| dt.format(&format).to_string())
                    .unwrap_or_default()
            }));
        }
        None => {
            let values = (0..arr.len())
                .map(|i| {
                    if arr.is_null(i) {
                        return Ok(None);
                    }
                    as_datetime::<T>(arr.value(i))
                        .with_context(|| format!("Timestamp out of range: {}", arr.value(i)))
                        .map(Some)
                })
                .collect::<Result<Vec<_>>>()?;

            let dates_only = values
                .iter()
                .flatten()
                .all(|dt| dt.num_seconds_from_midnight() == 0 && dt.nanosecond() == 0);
            let format = if dates_only {
                DATE_FORMAT.to_string()
            } else {
                timestamp_format(fraction_digits(
                    values.iter().flatten().map(|dt| dt.nanosecond()),
                ))
            };
            strings.extend(values.iter().map(|value| {
                value
                    .as_ref()
                    .map(|dt| dt.format(&format).to_string())
                    .unwrap_or_default()
            }));
        }
    }
    Ok(())
}

/// Fraction digits needed to show every sub-second part exactly: 0, 3, 6 or 9
fn fraction_digits(nanos: impl Iterator<Item = u32>) -> usize {
    nanos
        .map(|nanos| match nanos % 1_000_000_000 {
            0 => 0,
            n if n % 1_000_000 == 0 => 3,
            n if n % 1_000 == 0 => 6,
            _ => 9,
        })
        .max()
        .unwrap_or(0)
}

fn timestamp_format(fraction_digits: usize) -> String {
    match fraction_digits {
        0 => TIMESTAMP_FORMAT.to_string(),
        digits => format!("{}%.{}f", TIMESTAMP_FORMAT, digits),
    }
}

/// Render the remaining types through Arrow's display formatter
fn convert_with_formatter(array: &dyn Array, strings: &mut Vec<String>) -> Result<()> {
    let options = FormatOptions::default();
    let formatter = ArrayFormatter::try_new(array, &options)?;
    for i in 0..array.len() {
        strings.push(if array.is_null(i) {
            String::new()
        } else {
            formatter.value(i).try_to_string()?
        });
    }
    Ok(())
}

/// Place the decimal point of an unscaled integer rendering
fn apply_decimal_scale(unscaled: &str, scale: i8) -> String {
    let (sign, digits) = match unscaled.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", unscaled),
    };

    if scale <= 0 {
        if digits == "0" {
            return "0".to_string();
        }
        let zeros = "0".repeat(scale.unsigned_abs() as usize);
        return format!("{}{}{}", sign, digits, zeros);
    }

    let scale = scale as usize;
    let padded = if digits.len() <= scale {
        format!("{}{}", "0".repeat(scale + 1 - digits.len()), digits)
    } else {
        digits.to_string()
    };
    let (int_part, frac_part) = padded.split_at(padded.len() - scale);
    format!("{}{}.{}", sign, int_part, frac_part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{BooleanArray, Float64Array, Int32Array, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn single_column(field: Field, array: ArrayRef) -> RecordBatch {
        RecordBatch::try_new(Arc::new(Schema::new(vec![field])), vec![array]).unwrap()
    }

    fn rendered(batch: &RecordBatch) -> Vec<Vec<String>> {
        record_batch_to_records(batch)
            .unwrap()
            .into_iter()
            .map(|r| r.fields)
            .collect()
    }

    #[test]
    fn test_integers() {
        let schema = Schema::new(vec![
            Field::new("int32", DataType::Int32, false),
            Field::new("int64", DataType::Int64, false),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Int32Array::from(vec![1, -2, 3])),
                Arc::new(Int64Array::from(vec![100, 200, i64::MAX])),
            ],
        )
        .unwrap();

        assert_eq!(
            rendered(&batch),
            vec![
                vec!["1", "100"],
                vec!["-2", "200"],
                vec!["3", "9223372036854775807"],
            ]
        );
    }

    #[test]
    fn test_strings_with_nulls() {
        let batch = single_column(
            Field::new("name", DataType::Utf8, true),
            Arc::new(StringArray::from(vec![Some("Alice"), None, Some("a,b")])),
        );

        assert_eq!(rendered(&batch), vec![vec!["Alice"], vec![""], vec!["a,b"]]);
    }

    #[test]
    fn test_floats_keep_fraction() {
        let batch = single_column(
            Field::new("value", DataType::Float64, true),
            Arc::new(Float64Array::from(vec![
                Some(1.5),
                Some(3.0),
                None,
                Some(f64::NAN),
                Some(f64::NEG_INFINITY),
                Some(-0.25),
            ])),
        );

        assert_eq!(
            rendered(&batch),
            vec![
                vec!["1.5"],
                vec!["3.0"],
                vec![""],
                vec![""],
                vec!["-inf"],
                vec!["-0.25"],
            ]
        );
    }

    #[test]
    fn test_float_exponents_are_signed_and_padded() {
        let batch = single_column(
            Field::new("value", DataType::Float64, false),
            Arc::new(Float64Array::from(vec![1e20, 1.5e-7, -2.5e16, 1e-4, 123456.0])),
        );

        assert_eq!(
            rendered(&batch),
            vec![
                vec!["1e+20"],
                vec!["1.5e-07"],
                vec!["-2.5e+16"],
                vec!["0.0001"],
                vec!["123456.0"],
            ]
        );
    }

    #[test]
    fn test_pad_exponent() {
        assert_eq!(pad_exponent("3.0".to_string()), "3.0");
        assert_eq!(pad_exponent("1e300".to_string()), "1e+300");
        assert_eq!(pad_exponent("5e-324".to_string()), "5e-324");
        assert_eq!(pad_exponent("1e-5".to_string()), "1e-05");
    }

    #[test]
    fn test_float32_shortest_text() {
        let batch = single_column(
            Field::new("value", DataType::Float32, false),
            Arc::new(Float32Array::from(vec![0.1f32, 2.0])),
        );

        assert_eq!(rendered(&batch), vec![vec!["0.1"], vec!["2.0"]]);
    }

    #[test]
    fn test_booleans() {
        let batch = single_column(
            Field::new("flag", DataType::Boolean, true),
            Arc::new(BooleanArray::from(vec![Some(true), Some(false), None])),
        );

        assert_eq!(rendered(&batch), vec![vec!["True"], vec!["False"], vec![""]]);
    }

    #[test]
    fn test_dates() {
        // Date32 is days since epoch; 18993 = 2022-01-01
        let batch = single_column(
            Field::new("date", DataType::Date32, false),
            Arc::new(Date32Array::from(vec![0, 18993])),
        );

        assert_eq!(rendered(&batch), vec![vec!["1970-01-01"], vec!["2022-01-01"]]);
    }

    #[test]
    fn test_naive_timestamps() {
        // 2022-01-01 00:00:00 and 2022-01-01 00:00:00.250
        let batch = single_column(
            Field::new(
                "ts",
                DataType::Timestamp(TimeUnit::Millisecond, None),
                false,
            ),
            Arc::new(TimestampMillisecondArray::from(vec![
                1_640_995_200_000,
                1_640_995_200_250,
            ])),
        );

        assert_eq!(
            rendered(&batch),
            vec![
                vec!["2022-01-01 00:00:00.000"],
                vec!["2022-01-01 00:00:00.250"],
            ]
        );
    }

    #[test]
    fn test_midnight_timestamps_render_as_dates() {
        let batch = single_column(
            Field::new(
                "day",
                DataType::Timestamp(TimeUnit::Nanosecond, None),
                true,
            ),
            Arc::new(TimestampNanosecondArray::from(vec![
                Some(1_640_995_200_000_000_000),
                None,
                Some(1_641_081_600_000_000_000),
            ])),
        );

        assert_eq!(
            rendered(&batch),
            vec![vec!["2022-01-01"], vec![""], vec!["2022-01-02"]]
        );
    }

    #[test]
    fn test_timestamp_precision_is_shared_by_column() {
        // Whole second, 1.5 s, and 1 µs past 2022-01-01 12:00:00
        let batch = single_column(
            Field::new(
                "ts",
                DataType::Timestamp(TimeUnit::Microsecond, None),
                false,
            ),
            Arc::new(TimestampMicrosecondArray::from(vec![
                1_641_038_400_000_000,
                1_641_038_401_500_000,
                1_641_038_400_000_001,
            ])),
        );

        assert_eq!(
            rendered(&batch),
            vec![
                vec!["2022-01-01 12:00:00.000000"],
                vec!["2022-01-01 12:00:01.500000"],
                vec!["2022-01-01 12:00:00.000001"],
            ]
        );
    }

    #[test]
    fn test_fraction_digits() {
        assert_eq!(fraction_digits([0, 0].into_iter()), 0);
        assert_eq!(fraction_digits([0, 250_000_000].into_iter()), 3);
        assert_eq!(fraction_digits([1_000, 250_000_000].into_iter()), 6);
        assert_eq!(fraction_digits([7].into_iter()), 9);
        assert_eq!(fraction_digits(std::iter::empty()), 0);
    }

    #[test]
    fn test_timestamps_with_time_zone() {
        let array = TimestampSecondArray::from(vec![1_640_995_200]).with_timezone("+02:00");
        let batch = single_column(
            Field::new(
                "ts",
                DataType::Timestamp(TimeUnit::Second, Some("+02:00".into())),
                false,
            ),
            Arc::new(array),
        );

        assert_eq!(rendered(&batch), vec![vec!["2022-01-01 02:00:00+02:00"]]);
    }

    #[test]
    fn test_decimals() {
        let array = Decimal128Array::from(vec![Some(12345), Some(-1), None])
            .with_precision_and_scale(10, 2)
            .unwrap();
        let batch = single_column(
            Field::new("amount", DataType::Decimal128(10, 2), true),
            Arc::new(array),
        );

        assert_eq!(rendered(&batch), vec![vec!["123.45"], vec!["-0.01"], vec![""]]);
    }

    #[test]
    fn test_apply_decimal_scale() {
        assert_eq!(apply_decimal_scale("12345", 2), "123.45");
        assert_eq!(apply_decimal_scale("1", 2), "0.01");
        assert_eq!(apply_decimal_scale("100", 2), "1.00");
        assert_eq!(apply_decimal_scale("-12345", 2), "-123.45");
        assert_eq!(apply_decimal_scale("12345", 0), "12345");
        assert_eq!(apply_decimal_scale("12", -3), "12000");
        assert_eq!(apply_decimal_scale("0", -3), "0");
    }

    #[test]
    fn test_binary_as_hex() {
        let batch = single_column(
            Field::new("payload", DataType::Binary, true),
            Arc::new(BinaryArray::from(vec![Some(&b"\x01\xff"[..]), None])),
        );

        assert_eq!(rendered(&batch), vec![vec!["01ff"], vec![""]]);
    }

    #[test]
    fn test_list_falls_back_to_display() {
        let list = ListArray::from_iter_primitive::<Int32Type, _, _>(vec![
            Some(vec![Some(1), Some(2)]),
            None,
        ]);
        let field = Field::new(
            "values",
            DataType::List(Arc::new(Field::new_list_field(DataType::Int32, true))),
            true,
        );
        let batch = single_column(field, Arc::new(list));

        assert_eq!(rendered(&batch), vec![vec!["[1, 2]"], vec![""]]);
    }

    #[test]
    fn test_mixed_types_row_order() {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int32, false),
            Field::new("name", DataType::Utf8, true),
            Field::new("balance", DataType::Float64, true),
            Field::new("active", DataType::Boolean, false),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Int32Array::from(vec![1, 2])),
                Arc::new(StringArray::from(vec![Some("Alice"), Some("Bob")])),
                Arc::new(Float64Array::from(vec![Some(100.50), None])),
                Arc::new(BooleanArray::from(vec![true, false])),
            ],
        )
        .unwrap();

        assert_eq!(
            rendered(&batch),
            vec![
                vec!["1", "Alice", "100.5", "True"],
                vec!["2", "Bob", "", "False"],
            ]
        );
    }

    #[test]
    fn test_empty_batch() {
        let batch = single_column(
            Field::new("id", DataType::Int32, false),
            Arc::new(Int32Array::from(vec![] as Vec<i32>)),
        );

        assert!(record_batch_to_records(&batch).unwrap().is_empty());
    }
}
