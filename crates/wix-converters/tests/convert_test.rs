use wix_converters::{Converter, ConverterOptions, DiagnosticCode};

fn codes(diagnostics: &[wix_converters::Diagnostic]) -> Vec<DiagnosticCode> {
    diagnostics.iter().map(|d| d.code).collect()
}

const V3_PRODUCT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Wix xmlns="http://schemas.microsoft.com/wix/2006/wi" xmlns:util="http://schemas.microsoft.com/wix/UtilExtension">
    <Product Id="*" Name="App" Language="1033" Version="1.0.0.0" Manufacturer="Acme" UpgradeCode="PUT-GUID-HERE">
        <Package InstallerVersion="500" Compressed="yes" InstallScope="perMachine" Description="App installer" />
        <Condition Message="Windows 7 or later is required."><![CDATA[VersionNT >= 601]]></Condition>
        <Feature Id="Main" Absent="disallow">
            <ComponentRef Id="MainComponent" />
        </Feature>
    </Product>
</Wix>
"#;

const V4_PACKAGE: &str = r#"<Wix xmlns="http://wixtoolset.org/schemas/v4/wxs">
    <Package Name="App" Language="1033" Version="1.0.0.0" Manufacturer="Acme" UpgradeCode="PUT-GUID-HERE" InstallerVersion="500" Compressed="yes" Scope="perMachine">
        <SummaryInformation Description="App installer"/>
        <Launch Message="Windows 7 or later is required." Condition="VersionNT &gt;= 601"/>
        <Feature Id="Main" AllowAbsent="no">
            <ComponentRef Id="MainComponent"/>
        </Feature>
    </Package>
</Wix>
"#;

#[test]
fn test_v3_product_converts_to_v4_package() {
    let converter = Converter::new(ConverterOptions::default());
    let (out, diagnostics) = converter.convert_str(V3_PRODUCT);

    assert_eq!(out, V4_PACKAGE);
    assert_eq!(
        codes(&diagnostics),
        vec![
            DiagnosticCode::DeclarationPresent,
            DiagnosticCode::XmlnsValueWrong,
            DiagnosticCode::XmlnsValueWrong,
            DiagnosticCode::ProductAndPackageRenamed,
            DiagnosticCode::ProductIdObsolete,
            DiagnosticCode::PackageAttributeMoved,
            DiagnosticCode::PackageAttributeMoved,
            DiagnosticCode::InstallScopeRenamed,
            DiagnosticCode::SummaryInformationCreated,
            DiagnosticCode::LaunchConditionRenamed,
            DiagnosticCode::FeatureAbsentRenamed,
            DiagnosticCode::UnusedNamespaceDeclaration,
        ]
    );
}

#[test]
fn test_conversion_is_idempotent() {
    let converter = Converter::new(ConverterOptions::default());
    let (once, _) = converter.convert_str(V3_PRODUCT);

    let (twice, diagnostics) = converter.convert_str(&once);
    assert_eq!(twice, once);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let (formatted, diagnostics) = converter.format_str(&once);
    assert_eq!(formatted, once);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn test_unqualified_root_gets_namespace() {
    let (out, diagnostics) = Converter::default().convert_str("<Wix>\n    <Fragment />\n</Wix>");
    assert_eq!(
        out,
        "<Wix xmlns=\"http://wixtoolset.org/schemas/v4/wxs\">\n    <Fragment/>\n</Wix>"
    );
    assert_eq!(codes(&diagnostics), vec![DiagnosticCode::XmlnsMissing]);
}

#[test]
fn test_dependency_namespace_cascade() {
    let source = r#"<Wix xmlns="http://wixtoolset.org/schemas/v4/wxs" xmlns:util="http://wixtoolset.org/schemas/v4/wxs/util">
    <Fragment>
        <Component Id="A" xmlns:dep="http://schemas.microsoft.com/wix/DependencyExtension">
            <dep:Provides Key="A.Key"/>
        </Component>
        <Component Id="B">
            <util:User Id="U" Name="u"/>
        </Component>
    </Fragment>
</Wix>"#;
    let (out, diagnostics) = Converter::default().convert_str(source);

    insta::assert_snapshot!(out, @r#"
<Wix xmlns="http://wixtoolset.org/schemas/v4/wxs" xmlns:util="http://wixtoolset.org/schemas/v4/wxs/util">
    <Fragment>
        <Component Id="A" xmlns:dep="http://wixtoolset.org/schemas/v4/wxs">
            <Provides Key="A.Key"/>
        </Component>
        <Component Id="B">
            <util:User Id="U" Name="u"/>
        </Component>
    </Fragment>
</Wix>
"#);
    assert_eq!(codes(&diagnostics), vec![DiagnosticCode::XmlnsValueWrong]);
}

#[test]
fn test_obsolete_namespace_moves_names_out() {
    let source = r#"<Wix xmlns="http://wixtoolset.org/schemas/v4/wxs" xmlns:unit="http://schemas.microsoft.com/wix/2006/WixUnit"><Fragment><unit:Test/></Fragment></Wix>"#;
    let (out, diagnostics) = Converter::default().convert_str(source);
    assert_eq!(
        out,
        r#"<Wix xmlns="http://wixtoolset.org/schemas/v4/wxs"><Fragment><Test xmlns=""/></Fragment></Wix>"#
    );
    assert_eq!(codes(&diagnostics), vec![DiagnosticCode::XmlnsValueWrong]);
}

#[test]
fn test_tag_renamed_to_software_tag() {
    let source = r#"<Wix xmlns="http://wixtoolset.org/schemas/v4/wxs" xmlns:tag="http://wixtoolset.org/schemas/v4/wxs/tag"><Bundle><tag:Tag Regid="regid.acme" Licensed="yes" Type="application" InstallPath="x"><Extra/></tag:Tag></Bundle></Wix>"#;
    let (out, diagnostics) = Converter::default().convert_str(source);

    assert_eq!(
        out,
        r#"<Wix xmlns="http://wixtoolset.org/schemas/v4/wxs"><Bundle><SoftwareTag Regid="regid.acme" InstallPath="x"><Extra/></SoftwareTag></Bundle></Wix>"#
    );
    assert_eq!(
        codes(&diagnostics),
        vec![
            DiagnosticCode::TagElementRenamed,
            DiagnosticCode::SoftwareTagLicensedObsolete,
            DiagnosticCode::SoftwareTagTypeObsolete,
            DiagnosticCode::UnusedNamespaceDeclaration,
        ]
    );
}

#[test]
fn test_error_text_promoted_to_message() {
    let source = r#"<Wix xmlns="http://wixtoolset.org/schemas/v4/wxs"><Fragment><UI><Error Id="25000">Some message</Error></UI></Fragment></Wix>"#;
    let (out, diagnostics) = Converter::default().convert_str(source);
    assert!(out.contains(r#"<Error Id="25000" Message="Some message"/>"#), "{out}");
    assert_eq!(codes(&diagnostics), vec![DiagnosticCode::InnerTextDeprecated]);
}

#[test]
fn test_module_package_merged() {
    let source = r#"<Wix xmlns="http://wixtoolset.org/schemas/v4/wxs"><Module Id="M" Language="1033" Version="1.0"><Package Id="GUID-1" InstallerVersion="200" Manufacturer="Acme"/></Module></Wix>"#;
    let (out, _) = Converter::default().convert_str(source);
    assert_eq!(
        out,
        r#"<Wix xmlns="http://wixtoolset.org/schemas/v4/wxs"><Module Id="M" Language="1033" Version="1.0" Guid="GUID-1" InstallerVersion="200"><SummaryInformation Manufacturer="Acme"/></Module></Wix>"#
    );
}

#[test]
fn test_ignored_codes_leave_tree_alone() {
    let options = ConverterOptions::default().with_ignored([
        DiagnosticCode::ProductAndPackageRenamed,
        DiagnosticCode::DeclarationPresent,
    ]);
    let source = r#"<Wix xmlns="http://wixtoolset.org/schemas/v4/wxs"><Product Id="*" Name="App"/></Wix>"#;
    let (out, diagnostics) = Converter::new(options).convert_str(source);
    assert_eq!(out, source);
    assert!(diagnostics.is_empty());
}

#[test]
fn test_format_codes_not_reported_when_converting() {
    let source = "<Wix xmlns=\"http://wixtoolset.org/schemas/v4/wxs\">\n  <Fragment/>\n</Wix>";
    let (out, diagnostics) = Converter::default().convert_str(source);
    assert_eq!(out, source);
    assert!(diagnostics.is_empty());
}

#[test]
fn test_diagnostics_serialize_as_json() {
    let (_, diagnostics) = Converter::default().convert_str("<Wix/>");
    let value = serde_json::to_value(&diagnostics[0]).unwrap();
    assert_eq!(value["code"], "XmlnsMissing");
    assert_eq!(value["severity"], "error");
    assert_eq!(value["path"], "<input>");
    assert_eq!(value["line"], 1);
}
