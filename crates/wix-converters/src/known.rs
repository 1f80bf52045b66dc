//! Identifiers Windows Installer defines on its own.

use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Directories that v4 references through `StandardDirectory`.
pub static STANDARD_DIRECTORIES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "TARGETDIR",
        "AdminToolsFolder",
        "AppDataFolder",
        "CommonAppDataFolder",
        "CommonFilesFolder",
        "CommonFiles64Folder",
        "CommonFiles6432Folder",
        "DesktopFolder",
        "FavoritesFolder",
        "FontsFolder",
        "LocalAppDataFolder",
        "MyPicturesFolder",
        "NetHoodFolder",
        "PersonalFolder",
        "PrintHoodFolder",
        "ProgramFilesFolder",
        "ProgramFiles64Folder",
        "ProgramFiles6432Folder",
        "ProgramMenuFolder",
        "RecentFolder",
        "SendToFolder",
        "StartMenuFolder",
        "StartupFolder",
        "System16Folder",
        "SystemFolder",
        "System64Folder",
        "System6432Folder",
        "TempFolder",
        "TemplateFolder",
        "WindowsFolder",
        "WindowsVolume",
    ]
    .into_iter()
    .collect()
});

/// Properties that are always set, so a `PropertyRef` to them pulls in nothing.
pub static STANDARD_PROPERTIES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "AdminUser",
        "ComputerName",
        "Installed",
        "Intel",
        "LogonUser",
        "Manufacturer",
        "MsiNTProductType",
        "Msix64",
        "Privileged",
        "ProductCode",
        "ProductLanguage",
        "ProductName",
        "ProductState",
        "ProductVersion",
        "ServicePackLevel",
        "SystemLanguageID",
        "UpgradeCode",
        "UserLanguageID",
        "UserSID",
        "VersionMsi",
        "VersionNT",
        "VersionNT64",
        "WindowsBuild",
    ]
    .into_iter()
    .collect()
});

pub fn is_standard_directory(id: &str) -> bool {
    STANDARD_DIRECTORIES.contains(id)
}

pub fn is_standard_property(id: &str) -> bool {
    STANDARD_PROPERTIES.contains(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookups() {
        assert!(is_standard_directory("ProgramFilesFolder"));
        assert!(is_standard_directory("TARGETDIR"));
        assert!(!is_standard_directory("INSTALLFOLDER"));
        assert!(is_standard_property("VersionNT64"));
        assert!(!is_standard_property("MY_PROPERTY"));
    }
}
