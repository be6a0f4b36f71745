//! Distribution identity against captured `/etc` trees of real releases.

use hp_common::{OsInfo, ParseError};
use hp_core::parse::identify_distribution;
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/testdata")
        .join(name)
}

fn identify(name: &str) -> OsInfo {
    identify_distribution(&[fixture(name)]).expect("fixture should identify")
}

fn linux(
    family: &str,
    platform: &str,
    name: &str,
    version: &str,
    (major, minor, patch): (u64, u64, u64),
    codename: &str,
) -> OsInfo {
    OsInfo {
        os_type: "linux".to_string(),
        family: family.to_string(),
        platform: platform.to_string(),
        name: name.to_string(),
        version: version.to_string(),
        major,
        minor,
        patch,
        build: String::new(),
        codename: codename.to_string(),
    }
}

#[test]
fn amazon_2017_03() {
    assert_eq!(
        identify("amazon2017.03"),
        linux("redhat", "amzn", "Amazon Linux AMI", "2017.03", (2017, 3, 0), "")
    );
}

#[test]
fn centos6_from_release_file_only() {
    assert_eq!(
        identify("centos6"),
        linux("redhat", "centos", "CentOS", "6.9 (Final)", (6, 9, 0), "Final")
    );
}

#[test]
fn centos7_refined_from_centos_release() {
    assert_eq!(
        identify("centos7"),
        linux("redhat", "centos", "CentOS Linux", "7 (Core)", (7, 4, 1708), "Core")
    );
}

#[test]
fn debian9() {
    assert_eq!(
        identify("debian9"),
        linux("debian", "debian", "Debian GNU/Linux", "9 (stretch)", (9, 0, 0), "stretch")
    );
}

#[test]
fn raspbian9_family_from_id_like() {
    assert_eq!(
        identify("raspbian9"),
        linux("debian", "raspbian", "Raspbian GNU/Linux", "9 (stretch)", (9, 0, 0), "stretch")
    );
}

#[test]
fn redhat7() {
    assert_eq!(
        identify("redhat7"),
        linux(
            "redhat",
            "rhel",
            "Red Hat Enterprise Linux Server",
            "7.6 (Maipo)",
            (7, 6, 0),
            "Maipo"
        )
    );
}

#[test]
fn ubuntu1404_codename_from_lsb_release() {
    assert_eq!(
        identify("ubuntu1404"),
        linux("debian", "ubuntu", "Ubuntu", "14.04.5 LTS, Trusty Tahr", (14, 4, 5), "trusty")
    );
}

#[test]
fn ubuntu1710() {
    assert_eq!(
        identify("ubuntu1710"),
        linux("debian", "ubuntu", "Ubuntu", "17.10 (Artful Aardvark)", (17, 10, 0), "artful")
    );
}

#[test]
fn first_identifiable_root_wins() {
    let empty = tempfile::TempDir::new().unwrap();
    let info = identify_distribution(&[empty.path().to_path_buf(), fixture("debian9")]).unwrap();
    assert_eq!(info.platform, "debian");
}

#[test]
fn no_release_files_lists_searched_dirs() {
    let empty = tempfile::TempDir::new().unwrap();
    match identify_distribution(&[empty.path()]) {
        Err(ParseError::ReleaseFileNotFound { searched }) => {
            assert_eq!(searched, vec![empty.path().join("etc")]);
        }
        other => panic!("expected ReleaseFileNotFound, got {other:?}"),
    }
}
