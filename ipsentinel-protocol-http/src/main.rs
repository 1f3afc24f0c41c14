use ipsentinel_protocol_http::public_api_app;

pub fn main() {
    println!("{}", public_api_app().spec());
}
