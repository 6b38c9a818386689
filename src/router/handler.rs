//! Handler abstraction

use crate::http::{Request, ResponseWriter};

/// Something that answers a request by writing into the response sink.
///
/// Any `Fn(&mut ResponseWriter, &Request)` closure is a handler.
pub trait Handler: Send + Sync + 'static {
    fn serve(&self, w: &mut ResponseWriter, req: &Request);
}

impl<F> Handler for F
where
    F: Fn(&mut ResponseWriter, &Request) + Send + Sync + 'static,
{
    fn serve(&self, w: &mut ResponseWriter, req: &Request) {
        self(w, req);
    }
}
