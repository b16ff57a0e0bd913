use clap::Subcommand;
use diesel::sqlite::SqliteConnection;
use edms_api::models::Site;
use edms_api::orm::building::get_buildings;
use edms_api::orm::site::get_all_sites;

use crate::admin_cli::utils::filter_by_term;

#[derive(Subcommand)]
pub enum SiteAction {
    #[command(about = "List sites and their buildings, optionally filtered by search term")]
    Ls {
        #[arg(help = "Search term (regex by default, use -F for fixed string)")]
        search_term: Option<String>,
        #[arg(
            short = 'F',
            long = "fixed-string",
            help = "Treat search term as fixed string instead of regex"
        )]
        fixed_string: bool,
    },
}

pub fn handle_site_command_with_conn(
    conn: &mut SqliteConnection,
    action: SiteAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SiteAction::Ls { search_term, fixed_string } => {
            site_ls_impl(conn, search_term, fixed_string)?;
        }
    }
    Ok(())
}

pub fn site_ls_impl(
    conn: &mut SqliteConnection,
    search_term: Option<String>,
    fixed_string: bool,
) -> Result<Vec<Site>, Box<dyn std::error::Error>> {
    let sites = get_all_sites(conn)?;
    let filtered_sites =
        filter_by_term(sites, search_term.as_deref(), fixed_string, |s| s.name.as_str())?;

    if filtered_sites.is_empty() {
        println!("No sites found.");
    } else {
        println!("Sites:");
        for site in &filtered_sites {
            println!(
                "  ID: {}, Name: {}, Address: {}, Map: {}",
                site.id,
                site.name,
                site.address,
                site.map_image_path.as_deref().unwrap_or("none")
            );
            let buildings = get_buildings(conn, Some(site.id))?;
            if !buildings.is_empty() {
                let codes: Vec<&str> = buildings.iter().map(|b| b.code.as_str()).collect();
                println!("    Buildings: {}", codes.join(", "));
            }
        }
    }

    Ok(filtered_sites)
}

#[cfg(all(test, feature = "test-staging"))]
mod tests {
    use super::*;
    use edms_api::orm::testing::{insert_test_location, setup_test_db};

    #[test]
    fn test_site_ls_filters() {
        let mut conn = setup_test_db();
        insert_test_location(&mut conn, "EIT Taradale", "A", "A1");
        insert_test_location(&mut conn, "EIT Hastings", "Main", "Main Room");
        insert_test_location(&mut conn, "Depot", "D", "D1");

        assert_eq!(site_ls_impl(&mut conn, None, false).unwrap().len(), 3);

        let found = site_ls_impl(&mut conn, Some("^EIT".to_string()), false).unwrap();
        let names: Vec<&str> = found.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["EIT Hastings", "EIT Taradale"]);

        let found = site_ls_impl(&mut conn, Some("pot".to_string()), true).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Depot");
    }
}
