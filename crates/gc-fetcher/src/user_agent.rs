use rand::seq::SliceRandom;
use rand::Rng;

const SYSTEMS: &[(&str, &[&str])] = &[
    ("X11", &["Linux i686", "Linux x86_64"]),
    ("Macintosh", &["PPC Mac OS X 10.5"]),
    ("Windows", &["Windows NT 5.1", "Windows NT 6.0", "Windows NT 6.1"]),
];

/// Generates a Firefox 3.0.x user agent string.
///
/// Windows is picked three times out of five, X11 and Macintosh once each.
pub fn random_user_agent<R: Rng + ?Sized>(rng: &mut R) -> String {
    let (system, versions) = match rng.gen_range(1..=5) {
        1 => SYSTEMS[0],
        2 => SYSTEMS[1],
        _ => SYSTEMS[2],
    };
    let system_version = versions.choose(rng).copied().unwrap_or(versions[0]);
    let version: u8 = rng.gen_range(1..=13);
    let day: u8 = rng.gen_range(1..=31);
    let hour: u8 = rng.gen_range(1..=23);

    format!(
        "Mozilla/5.0 ({system}; U; {system_version}; en-US; rv:1.9.0.{version}) \
         Gecko/200907{day:02}{hour:02} Firefox/3.0.{version}"
    )
}

#[cfg(test)]
mod tests {
    use regex::Regex;

    use super::*;

    #[test]
    fn looks_like_firefox_3() {
        let re = Regex::new(
            r"^Mozilla/5\.0 \((X11|Macintosh|Windows); U; [^;]+; en-US; rv:1\.9\.0\.(\d+)\) Gecko/200907\d{4} Firefox/3\.0\.(\d+)$",
        )
        .unwrap();
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let ua = random_user_agent(&mut rng);
            let caps = re.captures(&ua).unwrap_or_else(|| panic!("unexpected {ua}"));
            assert_eq!(&caps[2], &caps[3]);
        }
    }
}
