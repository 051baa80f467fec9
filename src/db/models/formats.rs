//! Wire formats for calendar values that the default `time` serde
//! representation does not cover the way clients send them.

use time::{Date, Time};

time::serde::format_description!(pub hh_mm, Time, "[hour]:[minute]");
time::serde::format_description!(pub iso_date, Date, "[year]-[month]-[day]");
