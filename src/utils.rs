use std::num::ParseIntError;

use crate::config::Bounds;

/// Parse `lo..hi` row bounds given on the command line. Either side may be
/// empty: `..100`, `300..`, `..`.
pub fn parse_bounds(s: &str) -> Result<Bounds<usize>, ParseIntError> {
    let v = s.split("..").collect::<Vec<_>>();
    if v.len() != 2 {
        panic!("Could not find '..' when parsing row bounds.");
    }
    Ok(Bounds {
        min: parse_if_not_empty(v[0])?,
        max: parse_if_not_empty(v[1])?,
    })
}

fn parse_if_not_empty<T: std::str::FromStr>(s: &str) -> Result<Option<T>, <T as std::str::FromStr>::Err> {
    Ok(if s.is_empty() { None }
       else            { Some(s.parse()?) })
}

/// Group numeric digits to facilitate reading long numbers
pub fn group_digits<F: std::fmt::Display>(n: F) -> String {
    use numsep::{separate, Locale};
    separate(n, Locale::English)
}

pub mod timing {

    use super::group_digits;
    use std::time::Instant;
    use std::io::Write;

    /// Wall-clock reporting for the stages of an analysis pass.
    pub struct Stopwatch {
        previous: Instant,
    }

    impl Stopwatch {

        #[allow(clippy::new_without_default)]
        pub fn new() -> Self { Self { previous: Instant::now() } }

        /// Print message, append ellipsis, flush stdout, stay on same line, restart timer.
        pub fn start(&mut self, message: &str) {
            print!("{message} ... ");
            std::io::stdout().flush().unwrap();
            self.restart();
        }

        /// Print time elapsed since the last start or done
        pub fn done(&mut self) {
            println!("{} ms", group_digits(self.previous.elapsed().as_millis()));
            self.restart();
        }

        /// Print message followed by time elapsed since the last start or done
        pub fn done_with_message(&mut self, message: &str) {
            println!("{message}: {} ms",
                     group_digits(self.previous.elapsed().as_millis()));
            self.restart();
        }

        fn restart(&mut self) { self.previous = Instant::now() }
    }
}

#[cfg(test)]
mod test_parse_bounds {
    use super::*;

    #[test]
    fn both_sides() {
        let b = parse_bounds("10..20").unwrap();
        assert_eq!((b.min, b.max), (Some(10), Some(20)));
    }

    #[test]
    fn open_ended() {
        let b = parse_bounds("..").unwrap();
        assert_eq!((b.min, b.max), (None, None));
        let b = parse_bounds("5..").unwrap();
        assert_eq!((b.min, b.max), (Some(5), None));
    }
}
