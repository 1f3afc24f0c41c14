use ipsentinel_admin::admin_api_app;
use regex::Regex;

#[allow(clippy::unwrap_used)]
pub fn main() {
    let spec = admin_api_app().spec();
    let re = Regex::new(r"PaginatedResponse<(?P<name>\w+)>").unwrap();
    let spec = re.replace_all(&spec, "Paginated$name");

    println!("{spec}");
}
