use std::{
    net::TcpStream,
    sync::atomic::{AtomicBool, Ordering},
};

use log::{debug, info, warn};

use crate::{
    attr::{AttrError, codec, metadata::MetadataLookup},
    protocol::{ProtocolTransport, Request, Response, response::ResponseError},
    switch::{SwitchApi, SwitchError},
};

use super::transport::TransportError;

/// Request processor for one switch: converts wire attributes through the
/// codec, programs the device through [`SwitchApi`], and converts results
/// back. Owned by the single server worker thread.
pub struct RpcServer<M, S> {
    metadata: M,
    switch: S,
}

impl<M: MetadataLookup, S: SwitchApi> RpcServer<M, S> {
    pub fn new(metadata: M, switch: S) -> Self {
        Self { metadata, switch }
    }

    /// Serves one connection: requests are processed to completion in
    /// arrival order until the peer closes or asks to.
    ///
    /// The stream carries a read timeout, so the loop regularly returns to
    /// the caller's shutdown check instead of parking on an idle peer. A
    /// timeout mid-frame is safe: the transport keeps the partial bytes
    /// and the retry resumes the same frame.
    pub(super) fn handle_connection(
        &mut self,
        stream: TcpStream,
        shutdown: &AtomicBool,
    ) -> Result<(), TransportError> {
        let mut transport = ProtocolTransport::new(stream);

        loop {
            let req = match transport.read_request() {
                Ok(req) => req,
                Err(e) if e.is_timeout() => {
                    if shutdown.load(Ordering::SeqCst) {
                        return Ok(());
                    }
                    continue;
                }
                Err(e) if e.is_disconnect() => {
                    debug!("peer disconnected");
                    return Ok(());
                }
                Err(e) => return Err(e),
            };
            info!("received request: {req:?}");

            if req == Request::CloseConnection {
                transport.write_response(Response::ConnectionClosed)?;
                return Ok(());
            }

            let resp = self.dispatch(req);
            transport.write_response(resp)?;
        }
    }

    /// Executes one request. Codec and device errors turn into an `Err`
    /// response for this request only; the connection stays usable.
    pub fn dispatch(&mut self, req: Request) -> Response {
        match req {
            Request::Create { object_type, attrs } => {
                let mut native = Vec::with_capacity(attrs.len());
                for attr in &attrs {
                    match codec::decode(&self.metadata, object_type, attr) {
                        Ok(attr) => native.push(attr),
                        // Earlier siblings in `native` release on drop.
                        Err(e) => return attr_error_response(e),
                    }
                }
                match self.switch.create(object_type, native) {
                    Ok(oid) => Response::Created { oid },
                    Err(e) => switch_error_response(e),
                }
            }
            Request::Remove { object_type, oid } => {
                match self.switch.remove(object_type, oid) {
                    Ok(()) => Response::Removed,
                    Err(e) => switch_error_response(e),
                }
            }
            Request::Set {
                object_type,
                oid,
                attr,
            } => {
                let native = match codec::decode(&self.metadata, object_type, &attr) {
                    Ok(native) => native,
                    Err(e) => return attr_error_response(e),
                };
                match self.switch.set(object_type, oid, native) {
                    Ok(()) => Response::Ok,
                    Err(e) => switch_error_response(e),
                }
            }
            Request::Get {
                object_type,
                oid,
                attr_ids,
            } => {
                let native = match self.switch.get(object_type, oid, &attr_ids) {
                    Ok(native) => native,
                    Err(e) => return switch_error_response(e),
                };
                let mut attrs = Vec::with_capacity(native.len());
                for attr in native {
                    match codec::encode(&self.metadata, object_type, attr) {
                        Ok(attr) => attrs.push(attr),
                        Err(e) => return attr_error_response(e),
                    }
                }
                Response::Attrs { attrs }
            }
            Request::ObjectTypeQuery { oid } => match self.switch.object_type_query(oid) {
                Some(object_type) => Response::ObjectType { object_type },
                None => Response::Err {
                    code: ResponseError::InvalidParameter,
                    description: format!("unknown object {oid:#x}"),
                },
            },
            Request::SwitchIdQuery { oid } => match self.switch.switch_id_query(oid) {
                Some(oid) => Response::ObjectId { oid },
                None => Response::Err {
                    code: ResponseError::InvalidParameter,
                    description: format!("unknown object {oid:#x}"),
                },
            },
            Request::AvailabilityQuery { object_type, attrs } => {
                let mut native = Vec::with_capacity(attrs.len());
                for attr in &attrs {
                    match codec::decode(&self.metadata, object_type, attr) {
                        Ok(attr) => native.push(attr),
                        Err(e) => return attr_error_response(e),
                    }
                }
                // `native` drops when this arm ends, releasing its buffers.
                match self.switch.availability(object_type, &native) {
                    Ok(count) => Response::Availability { count },
                    Err(e) => switch_error_response(e),
                }
            }
            Request::EnumValuesQuery {
                object_type,
                attr_id,
            } => match self.switch.enum_values_capability(object_type, attr_id) {
                Some(values) => Response::EnumValues { values },
                None => Response::Err {
                    code: ResponseError::NotSupported,
                    description: format!(
                        "attribute {attr_id} of object type {object_type} has no enum capability"
                    ),
                },
            },
            Request::Ping => Response::Pong,
            Request::CloseConnection => Response::ConnectionClosed,
        }
    }
}

fn attr_error_response(e: AttrError) -> Response {
    let code = match &e {
        AttrError::UnknownAttribute { .. } | AttrError::CountMismatch { .. } => {
            ResponseError::InvalidParameter
        }
        AttrError::ValueShapeMismatch { .. } => ResponseError::NotSupported,
        AttrError::MalformedAddress { .. } => ResponseError::MalformedValue,
    };
    warn!("attribute conversion failed: {e}");
    Response::Err {
        code,
        description: e.to_string(),
    }
}

fn switch_error_response(e: SwitchError) -> Response {
    let code = match &e {
        SwitchError::ObjectTypeTooWide { .. } => ResponseError::InvalidParameter,
        _ => ResponseError::Switch,
    };
    Response::Err {
        code,
        description: e.to_string(),
    }
}
