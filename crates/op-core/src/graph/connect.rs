//! Conexiones, entrega de datos/metadatos y extensores.

use std::sync::Arc;

use super::{Graph, GroupId, PairId, PortId};
use crate::errors::GraphError;
use crate::metadata::MetaData;
use crate::model::{IOObject, ProvenanceEntry};
use crate::port::{ClearScope, Extension, GroupOwner, Port, PortDirection};

impl Graph {
    /// Conecta una salida con una entrada de la misma unidad.
    ///
    /// Falla si alguno de los dos ya está conectado o si sus contextos de
    /// conexión difieren; en ambos casos el grafo queda intacto. Si alguno
    /// de los grupos tiene extensor, se asienta después (aparece un puerto
    /// libre nuevo al final).
    pub fn connect(&mut self, output: PortId, input: PortId) -> Result<(), GraphError> {
        let (out, inp) = (self.port(output)?, self.port(input)?);
        if out.direction != PortDirection::Output || inp.direction != PortDirection::Input {
            return Err(GraphError::WrongDirection { output: self.port_label(output),
                                                    input: self.port_label(input) });
        }
        if out.connection.is_some() {
            return Err(GraphError::AlreadyConnected(self.port_label(output)));
        }
        if inp.connection.is_some() {
            return Err(GraphError::AlreadyConnected(self.port_label(input)));
        }
        match (self.connection_context(output), self.connection_context(input)) {
            (Some(a), Some(b)) if a == b => {}
            _ => {
                return Err(GraphError::CrossUnitConnection { output: self.port_label(output),
                                                             input: self.port_label(input) })
            }
        }
        let (out_group, in_group) = (out.group, inp.group);
        self.port_mut(output)?.connection = Some(input);
        self.port_mut(input)?.connection = Some(output);
        self.settle_group(out_group);
        self.settle_group(in_group);
        Ok(())
    }

    /// Corta la conexión de `port` (acepta cualquiera de los dos extremos).
    /// La entrada pierde datos y metadatos recibidos.
    pub fn disconnect(&mut self, port: PortId) -> Result<(), GraphError> {
        if self.port(port)?.connection.is_none() {
            return Err(GraphError::NotConnected(self.port_label(port)));
        }
        self.sever(port);
        Ok(())
    }

    /// Corta la conexión de `port` si la tiene y asienta los grupos de ambos
    /// extremos. Devuelve el otro extremo.
    pub(crate) fn sever(&mut self, port: PortId) -> Option<PortId> {
        let partner = self.ports.get(port)?.connection?;
        let mut groups = Vec::with_capacity(2);
        for id in [port, partner] {
            if let Some(p) = self.ports.get_mut(id) {
                p.connection = None;
                if p.direction == PortDirection::Input {
                    p.clear(ClearScope::All);
                }
                groups.push(p.group);
            }
        }
        for group in groups {
            self.settle_group(group);
        }
        Some(partner)
    }

    pub fn is_connected(&self, port: PortId) -> bool {
        self.ports.get(port).is_some_and(Port::is_connected)
    }

    pub fn source_of(&self, input: PortId) -> Option<PortId> {
        self.ports.get(input)?.source()
    }

    pub fn destination_of(&self, output: PortId) -> Option<PortId> {
        self.ports.get(output)?.destination()
    }

    /// ¿Aceptarían las precondiciones de `input` los metadatos actuales de `output`?
    pub fn is_compatible(&self, output: PortId, input: PortId) -> bool {
        let (Ok(out), Ok(inp)) = (self.port(output), self.port(input)) else { return false };
        let md = out.meta_data_or_unknown();
        inp.preconditions.iter().all(|p| p.is_compatible(&md))
    }

    // ----- entrega -----

    /// Entrega un objeto (o "sin valor") por una salida.
    pub fn deliver(&mut self, output: PortId, data: Option<IOObject>) -> Result<(), GraphError> {
        self.deliver_shared(output, data.map(Arc::new))
    }

    /// Como `deliver` pero con un objeto ya compartido. Si la salida es de un
    /// operador, el objeto entregado lleva una entrada más de procedencia
    /// (se copia; lo ya entregado nunca se muta).
    pub fn deliver_shared(&mut self, output: PortId, data: Option<Arc<IOObject>>) -> Result<(), GraphError> {
        let port = self.port(output)?;
        if port.direction != PortDirection::Output {
            return Err(GraphError::NotAnOutput(self.port_label(output)));
        }
        let data = match (data, self.groups.get(port.group).map(|g| g.owner)) {
            (Some(obj), Some(GroupOwner::Operator(op))) => {
                let mut obj = (*obj).clone();
                obj.append_history(ProvenanceEntry { operator: self.name_of(op).to_string(),
                                                     port: port.name.clone() });
                Some(Arc::new(obj))
            }
            (data, _) => data,
        };
        let destination = port.connection;
        if let Some(dest) = destination {
            self.port_mut(dest)?.data = data.clone();
        }
        self.port_mut(output)?.data = data;
        Ok(())
    }

    /// Versión estática de `deliver`: nunca toca los datos.
    pub fn deliver_meta_data(&mut self, output: PortId, meta_data: Option<MetaData>) -> Result<(), GraphError> {
        let port = self.port(output)?;
        if port.direction != PortDirection::Output {
            return Err(GraphError::NotAnOutput(self.port_label(output)));
        }
        if let Some(dest) = port.connection {
            self.port_mut(dest)?.meta_data = meta_data.clone();
        }
        self.port_mut(output)?.meta_data = meta_data;
        Ok(())
    }

    pub fn receive(&self, input: PortId) -> Option<&Arc<IOObject>> {
        self.ports.get(input)?.data.as_ref()
    }

    pub fn receive_meta_data(&self, input: PortId) -> MetaData {
        self.ports.get(input).map(Port::meta_data_or_unknown).unwrap_or_default()
    }

    /// Objetos presentes en los puertos conectados de un grupo, en orden.
    pub fn collect(&self, group: GroupId) -> Vec<Arc<IOObject>> {
        self.ports_of(group)
            .iter()
            .filter_map(|p| self.ports.get(*p))
            .filter(|p| p.is_connected())
            .filter_map(|p| p.data.clone())
            .collect()
    }

    /// Copia los datos de cada puerto izquierdo al derecho de su par.
    pub fn pass_data_through(&mut self, pair: PairId) -> Result<(), GraphError> {
        for (left, right) in self.pair(pair)?.pairs.clone() {
            let data = self.port(left)?.data.clone();
            self.deliver_shared(right, data)?;
        }
        Ok(())
    }

    /// Igual que `pass_data_through` para la pasada estática.
    pub fn pass_meta_data_through(&mut self, pair: PairId) -> Result<(), GraphError> {
        for (left, right) in self.pair(pair)?.pairs.clone() {
            let md = self.port(left)?.meta_data.clone();
            self.deliver_meta_data(right, md)?;
        }
        Ok(())
    }

    // ----- limpieza -----

    pub fn clear_port(&mut self, port: PortId, scope: ClearScope) -> Result<(), GraphError> {
        self.port_mut(port)?.clear(scope);
        Ok(())
    }

    /// Limpia todos los puertos del grafo (y los problemas de los operadores
    /// si el alcance incluye metadatos).
    pub fn clear_all(&mut self, scope: ClearScope) {
        for id in self.ports.ids() {
            if let Some(p) = self.ports.get_mut(id) {
                p.clear(scope);
            }
        }
        if scope.meta_data() {
            for id in self.operators.ids() {
                if let Some(op) = self.operators.get_mut(id) {
                    op.issues.clear();
                }
            }
        }
    }

    // ----- extensores -----

    /// Restablece el invariante del extensor del grupo, si lo tiene.
    pub(crate) fn settle_group(&mut self, group: GroupId) {
        let pair = match self.groups.get(group).and_then(|g| g.extension.as_ref()) {
            Some(Extension::Single(_)) => None,
            Some(Extension::Pair(pid)) => Some(*pid),
            None => return,
        };
        match pair {
            None => self.settle_single(group),
            Some(pid) => self.settle_pair(pid),
        }
    }

    fn settle_single(&mut self, group: GroupId) {
        let extended: Vec<PortId> = self.ports_of(group)
                                        .iter()
                                        .copied()
                                        .filter(|p| self.ports.get(*p).is_some_and(|p| p.extended))
                                        .collect();
        if let Some((_, rest)) = extended.split_last() {
            for &p in rest {
                if !self.is_connected(p) {
                    self.remove_port(p);
                }
            }
        }
        if extended.last().map_or(true, |last| self.is_connected(*last)) {
            self.add_extended_port(group);
        }
    }

    fn settle_pair(&mut self, pair: PairId) {
        let Some(pairs) = self.pairs.get(pair).map(|p| p.pairs.clone()) else { return };
        let used = |g: &Graph, (l, r): (PortId, PortId)| g.is_connected(l) || g.is_connected(r);
        let mut kept = Vec::with_capacity(pairs.len() + 1);
        if let Some((last, rest)) = pairs.split_last() {
            for &(l, r) in rest {
                if used(self, (l, r)) {
                    kept.push((l, r));
                } else {
                    self.remove_port(l);
                    self.remove_port(r);
                }
            }
            kept.push(*last);
        }
        let needs_spare = kept.last().map_or(true, |&last| used(self, last));
        if let Some(p) = self.pairs.get_mut(pair) {
            p.pairs = kept;
        }
        if needs_spare {
            self.add_extended_pair(pair);
        }
    }

    fn add_extended_port(&mut self, group: GroupId) {
        let Some(g) = self.groups.get_mut(group) else { return };
        let direction = g.direction;
        let Some(Extension::Single(ext)) = g.extension.as_mut() else { return };
        let name = ext.next_name();
        let preconditions = ext.preconditions.clone();
        let mut port = Port::new(&name, direction, group);
        port.extended = true;
        port.optional = true;
        port.preconditions = preconditions;
        let id = self.ports.insert(port);
        if let Some(g) = self.groups.get_mut(group) {
            g.ports.push(id);
        }
    }

    fn add_extended_pair(&mut self, pair: PairId) {
        let Some(p) = self.pairs.get_mut(pair) else { return };
        let (left_name, right_name) = p.next_names();
        let (left_group, right_group) = (p.left, p.right);
        let mut ids = [None, None];
        for (slot, (group, name)) in [(left_group, left_name), (right_group, right_name)].into_iter().enumerate() {
            let Some(direction) = self.groups.get(group).map(|g| g.direction) else { return };
            let mut port = Port::new(&name, direction, group);
            port.extended = true;
            port.optional = true;
            let id = self.ports.insert(port);
            if let Some(g) = self.groups.get_mut(group) {
                g.ports.push(id);
            }
            ids[slot] = Some(id);
        }
        if let ([Some(l), Some(r)], Some(p)) = (ids, self.pairs.get_mut(pair)) {
            p.pairs.push((l, r));
        }
    }

    /// Retira un puerto sin conexión de su grupo y de la arena.
    pub(crate) fn remove_port(&mut self, port: PortId) {
        if let Some(p) = self.ports.remove(port) {
            if let Some(g) = self.groups.get_mut(p.group) {
                g.ports.retain(|id| *id != port);
            }
        }
    }

    /// Puerto de `group` con ese nombre. Si no existe y el nombre es de
    /// los que genera el extensor del grupo, se adopta el puerto libre del
    /// final rebautizándolo con ese nombre; así una definición guardada se
    /// reconstruye con la misma numeración aunque haya huecos.
    pub(crate) fn port_for_wiring(&mut self, group: GroupId, name: &str) -> Result<PortId, GraphError> {
        if let Some(p) = self.port_in_group(group, name) {
            return Ok(p);
        }
        let unknown = || GraphError::UnknownPort(name.to_string());
        let spare = self.ports_of(group)
                        .iter()
                        .rev()
                        .copied()
                        .find(|p| self.ports.get(*p).is_some_and(|p| p.extended && !p.is_connected()))
                        .ok_or_else(unknown)?;
        match self.groups.get_mut(group).and_then(|g| g.extension.as_mut()) {
            Some(Extension::Single(ext)) => {
                let index = ext.index_of(name).ok_or_else(unknown)?;
                let new_name = ext.reserve(index);
                self.port_mut(spare)?.name = new_name;
                Ok(spare)
            }
            Some(Extension::Pair(pid)) => {
                let pid = *pid;
                let pair = self.pairs.get_mut(pid).ok_or_else(unknown)?;
                let left = pair.left == group;
                let index = pair.index_of(left, name).ok_or_else(unknown)?;
                let (l, r) = *pair.pairs.iter().find(|(l, r)| *l == spare || *r == spare).ok_or_else(unknown)?;
                let (left_name, right_name) = pair.reserve(index);
                self.port_mut(l)?.name = left_name;
                self.port_mut(r)?.name = right_name;
                Ok(spare)
            }
            None => Err(unknown()),
        }
    }
}
