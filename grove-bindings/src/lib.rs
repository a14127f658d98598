// grove-bindings: engine class declarations generated by build.rs from
// api/extension_api.json, plus hand-written extensions in `manual`.

include!(concat!(env!("OUT_DIR"), "/bindings.rs"));

pub mod manual;
