use clap::Parser;

use crate::{core::battery::Sku, tables::build_catalog_table};

#[derive(Parser)]
pub struct CatalogArgs {
    /// Apply the purchase subsidy.
    #[clap(long = "grant", env = "GRANT")]
    pub grant: bool,
}

pub fn catalog(args: &CatalogArgs) {
    let batteries = Sku::ALL.map(|sku| {
        let mut battery = sku.battery();
        battery.set_grant(args.grant);
        (sku, battery)
    });
    println!("{}", build_catalog_table(&batteries));
}
